pub mod types;

mod ai_api;
mod generation_api;
mod history_api;
mod preview_api;
mod workflow_api;

pub use ai_api::*;
pub use generation_api::*;
pub use history_api::*;
pub use preview_api::*;
pub use workflow_api::*;

use actix_web::web;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/workflow")
            .service(get_workflow)
            .service(save_workflow)
            .service(get_workflow_diff)
            .service(create_node)
            .service(update_node)
            .service(delete_node)
            .service(create_edge)
            .service(delete_edge),
    )
    .service(
        web::scope("/generations")
            .service(create_generation)
            .service(get_last_generation)
            .service(export_generation),
    )
    .service(web::scope("/history").service(get_history).service(clear_history))
    .service(
        web::scope("/preview")
            .service(publish_preview)
            .service(get_preview_index)
            .service(get_preview_file),
    )
    .service(web::scope("/ai").service(ai_completion));
}
