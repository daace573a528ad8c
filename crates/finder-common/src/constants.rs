//! Shared constants for Finder components.

/// Default settle window after a discovery broadcast (1 second)
pub const DEFAULT_SETTLE_WINDOW_MS: u64 = 1000;

/// Default configuration file consumed by the `finder` binary
pub const DEFAULT_CONFIG_PATH: &str = "config/finder.toml";

/// Backend descriptions returned by `Finder::describe`
pub mod backends {
    pub const STATIC: &str = "static";
    pub const SHARED: &str = "shared";
    pub const DISCOVERY: &str = "discovery";
}

/// Discovery device and property codes
pub mod device {
    /// Object code of the finder device announced by every node
    pub const FINDER_DEVICE_CODE: u32 = 0x0F9101;

    /// Node condition (same slot as the operation status of a device)
    pub const CONDITION_CODE: u8 = 0x80;
    /// Manufacturer code, declared by devices but not mapped to a node field
    pub const MANUFACTURER_CODE: u8 = 0x8A;
    pub const CLUSTER_CODE: u8 = 0xA0;
    pub const HOST_CODE: u8 = 0xA1;
    pub const ADDRESS_CODE: u8 = 0xA2;
    pub const RPC_PORT_CODE: u8 = 0xA3;
    pub const CLOCK_CODE: u8 = 0xB0;
    pub const VERSION_CODE: u8 = 0xB1;

    pub const CONDITION_SIZE: usize = 1;
    pub const RPC_PORT_SIZE: usize = 4;
    pub const CLOCK_SIZE: usize = 8;
    pub const VERSION_SIZE: usize = 8;
}
