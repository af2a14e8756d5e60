// Shared:
pub const DEFAULT_TICK_RATE: f64 = 60.0; // Ticks per second, client and authority alike.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024; // 1024 ticks, ~17s at 60Hz.

// Client:
pub const DEFAULT_ROTATION_THRESHOLD_DEGREES: f32 = 5.0;
pub const DEFAULT_POSITION_THRESHOLD: f32 = 0.5; // World units.
pub const DEFAULT_RESOURCE_THRESHOLD: f32 = 1.0; // Resource units.

// Server:
pub const MAX_PLAYERS: usize = 10;
