/// HTTP endpoint paths served by request listeners and the parameter server.
pub mod endpoints {
    pub const MEM_REGISTRATION: &str = "/mem/registration";
    pub const MEM_DELETION: &str = "/mem/deletion";
    pub const MEM_READ: &str = "/mem/read";
    pub const MEM_WRITE: &str = "/mem/write";
    pub const MEM_LIST: &str = "/mem/list";

    pub const PARAM_REGISTRATION: &str = "/param/registration";
    pub const PARAM_DELETION: &str = "/param/deletion";
    pub const PARAM_READ: &str = "/param/read";
    pub const PARAM_WRITE: &str = "/param/write";
    pub const PARAM_CAS: &str = "/param/cas";

    pub const HEALTH: &str = "/health";
    pub const STOP: &str = "/stop";
}

/// Body of a successful health check.
pub const HEALTH_OK: &str = "OK";
