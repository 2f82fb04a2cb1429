use anyhow::Result;
use log::info;
use tokio::net::TcpListener;

pub use crate::{
    http_api_config::HttpApiConfig,
    misc::{Broadcaster, SyncedStatus},
    routing::RouterState,
};

mod error;
mod extractors;
mod http_api_config;
mod middleware;
mod misc;
mod response;
mod routing;
mod standard;

pub struct HttpApi {
    pub config: HttpApiConfig,
    pub router_state: RouterState,
}

impl HttpApi {
    pub async fn run(self) -> Result<()> {
        let Self {
            config,
            router_state,
        } = self;

        let listener = TcpListener::bind(config.address).await?;

        info!("HTTP API is listening on {}", listener.local_addr()?);

        let router = routing::routes(router_state);

        axum::serve(listener, router).await?;

        Ok(())
    }
}
