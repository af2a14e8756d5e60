const DEFAULT_PRIVATE_KEY: [u8; 32] = [
    211, 120, 2, 54, 202, 170, 80, 236, 225, 33, 220, 193, 223, 199, 20, 80, 202, 88, 77, 123, 88,
    129, 160, 222, 33, 251, 99, 37, 145, 18, 199, 199,
];

/// Key shared by client and server for netcode connect tokens.
pub fn private_key() -> [u8; 32] {
    DEFAULT_PRIVATE_KEY
}
