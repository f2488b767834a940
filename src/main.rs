use std::sync::Arc;

use tokio::net::TcpListener;

use agora_wiki::logger::Logger;
use agora_wiki::{router, AppState, Config, GitGateway, WikiError};

#[tokio::main]
async fn main() -> Result<(), WikiError> {
    if let Err(e) = Logger::init() {
        eprintln!("logger already installed: {}", e);
    }

    let config = Config::from_env()?;
    if !config.repo_dir.exists() {
        log::error!("Wiki repository {:?} does not exist", config.repo_dir);
        return Err(WikiError::NotFound(config.repo_dir.display().to_string()));
    }

    let git = GitGateway::with_binary(config.repo_dir.as_ref().clone(), config.git_binary.clone());
    let state = AppState::new(Arc::new(git), config.static_dir.as_ref().clone());

    let addr = config.socket_addr()?;
    log::info!("Wiki listening on http://{} serving {:?}", addr, config.repo_dir);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await.map_err(WikiError::from)
}
