use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/files", file_routes(config))
}

fn file_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let collection = OpenApiRouter::new()
        .routes(routes!(
            handlers::file::list_files,
            handlers::file::upload_file
        ))
        .layer(handlers::file::upload_body_limit(
            config.storage.max_upload_size,
        ));

    OpenApiRouter::new().merge(collection).routes(routes!(
        handlers::file::download_file,
        handlers::file::update_visibility,
        handlers::file::delete_file
    ))
}
