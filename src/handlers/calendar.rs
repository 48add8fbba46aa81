use crate::services::CalendarService;
use actix_web::{HttpResponse, ResponseError, Result, http::header, web};

#[utoipa::path(
    get,
    path = "/calendar/evenements.ics",
    tag = "calendar",
    responses(
        (status = 200, description = "Flux iCalendar des événements publics", body = String, content_type = "text/calendar")
    )
)]
pub async fn export_ics(calendar_service: web::Data<CalendarService>) -> Result<HttpResponse> {
    match calendar_service.export_ics().await {
        Ok(ics) => Ok(HttpResponse::Ok()
            .content_type("text/calendar; charset=utf-8")
            .insert_header((
                header::CONTENT_DISPOSITION,
                "inline; filename=\"evenements.ics\"",
            ))
            .body(ics)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn calendar_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/calendar").route("/evenements.ics", web::get().to(export_ics)));
}
