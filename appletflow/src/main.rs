mod api;
mod app;
mod constants;
mod errors;
mod models;
mod resources;
mod services;

use actix_web::middleware::Logger;
use actix_web::{web, App as ActixWebApp, HttpServer};
use app::App;

#[tokio::main]
async fn main() {
    let app = App::new()
        .await
        .unwrap_or_else(|e| panic!("Could not initialize application.\n{}", e));
    let port = app.port();

    app.init();
    let app_web_data = web::Data::new(app);

    HttpServer::new(move || {
        ActixWebApp::new()
            .wrap(Logger::new("%a %r %s %b %{Referer}i %{User-Agent}i %T"))
            .wrap(app_web_data.cors())
            .app_data(app_web_data.clone())
            .configure(api::routes)
    })
    .bind(("0.0.0.0", port))
    .unwrap_or_else(|e| panic!("Could not bind to port {}.\n{}", port, e))
    .run()
    .await
    .unwrap_or_else(|e| panic!("Could not run server to port {}.\n{}", port, e));
}
