use core::net::SocketAddr;

#[derive(Clone, Copy, Debug)]
pub struct HttpApiConfig {
    pub address: SocketAddr,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([127, 0, 0, 1], 5052)),
        }
    }
}

impl HttpApiConfig {
    #[must_use]
    pub fn with_address(address: impl Into<SocketAddr>) -> Self {
        Self {
            address: address.into(),
        }
    }
}
