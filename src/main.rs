mod errors;
mod logging;
mod initialization;
mod handlers;
mod models;
mod numeric;
mod normalizer;
mod manager_carbon;
mod manager_realtime;
mod manager_subscription;
mod manager_weather;
mod manager_co2_reference;
mod reference;
mod view_cycle;
mod highlight;
mod export;
mod preferences;
mod clock;
mod dashboard;
mod cache;
mod serialize_timestamp;

use actix_web::{middleware, web, App, HttpServer};
use actix_files::Files;
use log::info;
use crate::dashboard::{current_month0, Command, Dashboard, DashboardHandle};
use crate::errors::UnrecoverableError;
use crate::handlers::{download, events, get_data, get_series, select_view, toggle_month};
use crate::initialization::config;
use crate::manager_co2_reference::Co2Reference;
use crate::manager_realtime::RealtimeDb;
use crate::manager_weather::Weather;
use crate::preferences::load_visible_months;
use crate::reference::HttpReferenceData;

struct AppState {
    dashboard: DashboardHandle,
}

#[actix_web::main]
async fn main() -> Result<(), UnrecoverableError> {
    let config = config()?;

    let transport = RealtimeDb::new(&config.realtime.database_url, config.realtime.reconnect_secs)?;
    let reference = HttpReferenceData::new(
        Weather::new(&config.weather.host, &config.weather.api_key, &config.weather.location)?,
        Co2Reference::new(&config.co2_reference.url)?,
        &config.files.cache_dir,
    );
    let months = load_visible_months(&config.files.cache_dir, current_month0()).await;

    let (dashboard, handle) = Dashboard::new(&config.cycle, &config.files, transport, reference, months);
    let runner = actix_web::rt::spawn(dashboard.run());

    let web_data = web::Data::new(AppState { dashboard: handle.clone() });
    let static_dir = config.web_server.static_dir.clone();

    info!("starting web server");
    HttpServer::new(move || {
        App::new()
            .app_data(web_data.clone())
            .service(get_data)
            .service(select_view)
            .service(get_series)
            .service(toggle_month)
            .service(download)
            .service(events)
            .service(
                web::scope("")
                    .wrap(middleware::DefaultHeaders::new().add(("Cache-Control", "no-cache")))
                    .service(Files::new("/", &static_dir).index_file("index.html"))
            )
    })
        .bind((config.web_server.bind_address.as_str(), config.web_server.bind_port))?
        .run()
        .await?;

    info!("web server stopped, shutting down dashboard");
    let _ = handle.commands.send(Command::Shutdown);
    let _ = runner.await;

    Ok(())
}
