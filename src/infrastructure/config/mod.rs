mod settings;

pub use settings::{
    DatabaseConfig, DispatchConfig, GatewayConfig, LoggingConfig, OtelConfig, ServerConfig, Settings,
    EXPO_MAX_BATCH_SIZE,
};
