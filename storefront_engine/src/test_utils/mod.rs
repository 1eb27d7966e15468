pub mod prepare_env;
pub mod recording_notifier;
pub mod seed;
