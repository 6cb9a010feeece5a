use std::convert::Infallible;
use actix_web::{get, web, HttpResponse, Responder};
use actix_web::web::Bytes;
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::oneshot;
use crate::AppState;
use crate::dashboard::Command;
use crate::export::build_backup;
use crate::manager_carbon::{carbon_series, CarbonPoint};
use crate::models::{Domain, Granularity, ViewKey};

#[derive(Deserialize)]
struct SeriesParams {
    pub domain: String,
    pub granularity: String,
}

#[derive(Deserialize)]
struct MonthParams {
    pub month: String,
}

#[derive(Serialize)]
struct SeriesData {
    domain: Domain,
    granularity: Granularity,
    points: Vec<Map<String, Value>>,
    carbon: Vec<CarbonPoint>,
}

#[get("/get_data")]
pub async fn get_data(data: web::Data<AppState>) -> impl Responder {
    let state = data.dashboard.state.borrow().clone();

    HttpResponse::Ok().json(state)
}

#[get("/select/{view}")]
pub async fn select_view(data: web::Data<AppState>, view: web::Path<String>) -> impl Responder {
    let view = match view.parse::<ViewKey>() {
        Ok(view) => view,
        Err(e) => return HttpResponse::BadRequest().body(e),
    };

    info!("view {} selected", view);
    send_command(&data, Command::Select(view))
}

#[get("/get_series")]
pub async fn get_series(data: web::Data<AppState>, params: web::Query<SeriesParams>) -> impl Responder {
    let (domain, granularity) = match (params.domain.parse::<Domain>(), params.granularity.parse::<Granularity>()) {
        (Ok(domain), Ok(granularity)) => (domain, granularity),
        (Err(e), _) | (_, Err(e)) => return HttpResponse::BadRequest().body(e),
    };

    let pivots = data.dashboard.state.borrow().pivots.clone();
    let series = SeriesData {
        domain,
        granularity,
        points: pivots.get(domain).points(granularity).to_vec(),
        carbon: carbon_series(&pivots.electricity, &pivots.vehicle, granularity),
    };

    HttpResponse::Ok().json(series)
}

#[get("/toggle_month")]
pub async fn toggle_month(data: web::Data<AppState>, params: web::Query<MonthParams>) -> impl Responder {
    send_command(&data, Command::ToggleMonth(params.month.clone()))
}

#[get("/download")]
pub async fn download(data: web::Data<AppState>) -> impl Responder {
    let pivots = data.dashboard.state.borrow().pivots.clone();

    match build_backup(&pivots, Utc::now()) {
        Ok(backup) => {
            info!("manual export of {}", backup.filename);
            HttpResponse::Ok()
                .content_type("application/json")
                .insert_header(("Content-Disposition", format!("attachment; filename=\"{}\"", backup.filename)))
                .body(backup.json)
        }
        Err(e) => {
            warn!("manual export failed: {}", e);
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}

#[get("/events")]
pub async fn events(data: web::Data<AppState>) -> impl Responder {
    let (reply_tx, reply_rx) = oneshot::channel();
    if data.dashboard.commands.send(Command::ListenCues(reply_tx)).is_err() {
        return HttpResponse::ServiceUnavailable().finish();
    }

    let Ok(Some(cues)) = reply_rx.await else {
        return HttpResponse::ServiceUnavailable().finish();
    };

    let stream = futures_util::stream::unfold(cues, |mut cues| async move {
        loop {
            match cues.recv().await {
                Ok(cue) => {
                    let json = serde_json::to_string(&cue).unwrap_or_default();
                    let chunk = Bytes::from(format!("event: cue\ndata: {}\n\n", json));
                    return Some((Ok::<_, Infallible>(chunk), cues));
                }
                Err(RecvError::Lagged(skipped)) => warn!("cue listener skipped {} cues", skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}

fn send_command(data: &AppState, command: Command) -> HttpResponse {
    match data.dashboard.commands.send(command) {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(e) => {
            warn!("dashboard unavailable: {}", e);
            HttpResponse::ServiceUnavailable().finish()
        }
    }
}
