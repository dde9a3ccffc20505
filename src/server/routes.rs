use crate::query::QueryService;

use super::http::{Request, Response};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

pub const QUERY_PATH: &str = "/temperature_query.json";
pub const NOW_PATH: &str = "/temperature_now.json";
pub const FAVICON_PATH: &str = "/favicon.ico";

pub async fn route(request: &Request, service: &QueryService, peer: &str) -> Response {
    if request.method != "GET" {
        return Response::text(405, "Error 405 - method not allowed");
    }

    match request.path.as_str() {
        QUERY_PATH => history(request, service, peer).await,
        NOW_PATH => current(service).await,
        FAVICON_PATH => Response::empty(200, "image/x-icon"),
        other => {
            log_info!("Request from {peer} for unknown path {other}");
            Response::text(404, "Error 404 - file not found")
        }
    }
}

async fn history(request: &Request, service: &QueryService, peer: &str) -> Response {
    let num_obs = request.param("num_obs");
    let start_date = request.param("start_date");

    log_info!(
        "Database query request from {peer} for {} records from {}",
        num_obs.unwrap_or("default"),
        start_date.unwrap_or("epoch")
    );

    match service.handle(num_obs, start_date).await {
        Ok(body) => Response::json(&body),
        Err(err) => {
            log_error!("Error querying database: {err:#}");
            Response::text(500, format!("{err:#}\n"))
        }
    }
}

async fn current(service: &QueryService) -> Response {
    match service.current().await {
        Ok(body) => Response::json(&body),
        Err(err) => {
            log_error!("Live temperature read failed: {err}");
            Response::text(500, format!("{err}\n"))
        }
    }
}
