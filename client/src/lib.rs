pub mod host;
pub mod input;
pub mod net;
pub mod predictor;
pub mod reconcile;
pub mod run;

#[cfg(test)]
mod test_helpers;
