use actix_web::error::{InternalError, UrlencodedError};
use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::analytics::{self, DashboardData};
use crate::charts::{self, ChartSet};
use crate::config::AppConfig;
use crate::data::{self, StudentTable, TARGET_COLUMN};
use crate::error::Result;
use crate::model::GradeModel;
use crate::pages::{self, AnalysisTab, PredictionView};
use crate::prediction::{predict_grade, PredictionForm};
use crate::preprocess::{self, LabelEncoder};

/// Everything computed at startup and shared read-only by all requests.
pub struct AppState {
    pub user_login: String,
    pub table: StudentTable,
    pub dashboard: DashboardData,
    pub charts: ChartSet,
    pub model: GradeModel,
    pub encoders: BTreeMap<String, LabelEncoder>,
}

impl AppState {
    pub fn load(config: &AppConfig) -> Result<Self> {
        log::info!("Loading student data from {}", config.data_path.display());
        let table = data::load_students(&config.data_path)?;
        Self::from_table(table, config)
    }

    pub fn from_table(table: StudentTable, config: &AppConfig) -> Result<Self> {
        log::info!("Loaded {} student records", table.len());

        let dataset = preprocess::encode(&table, TARGET_COLUMN)?;
        log::info!(
            "Encoded categorical columns: {:?}",
            dataset.encoders.keys().collect::<Vec<_>>()
        );

        log::info!("Training linear regression on {} features...", dataset.feature_names.len());
        let model = GradeModel::fit(&dataset, TARGET_COLUMN, config.test_size, config.split_seed)?;
        let info = model.info();
        log::info!(
            "Model trained: {} train / {} test rows, R2 {:.3}, MAE {:.3}",
            info.train_rows,
            info.test_rows,
            info.r2,
            info.mean_absolute_error
        );

        let dashboard = analytics::dashboard_data(&table)?;
        let charts = charts::render_all(&analytics::analysis_data(&table)?)?;

        Ok(Self {
            user_login: config.user_login.clone(),
            table,
            dashboard,
            charts,
            model,
            encoders: dataset.encoders,
        })
    }
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body)
}

/// Serves both `/` and `/dashboard`.
async fn dashboard(state: web::Data<AppState>) -> HttpResponse {
    html(pages::dashboard_page(&state.user_login, &state.dashboard))
}

#[derive(Deserialize)]
pub struct AnalysisQuery {
    tab: Option<String>,
}

async fn analysis(state: web::Data<AppState>, query: web::Query<AnalysisQuery>) -> HttpResponse {
    let tab = AnalysisTab::from_query(query.tab.as_deref());
    html(pages::analysis_page(&state.user_login, &state.charts, tab))
}

async fn prediction_form(state: web::Data<AppState>) -> HttpResponse {
    html(pages::prediction_page(
        &state.user_login,
        &PredictionForm::default(),
        PredictionView::Empty,
    ))
}

async fn submit_prediction(state: web::Data<AppState>, form: web::Form<PredictionForm>) -> HttpResponse {
    let form = form.into_inner();
    let body = match predict_grade(&state.model, &state.encoders, &form) {
        Ok(prediction) => {
            log::info!("Predicted grade {} (raw {:.3})", prediction.grade, prediction.raw);
            pages::prediction_page(&state.user_login, &form, PredictionView::Result(&prediction))
        }
        Err(e) => {
            log::warn!("Prediction failed: {}", e);
            let message = e.to_string();
            pages::prediction_page(&state.user_login, &form, PredictionView::Error(&message))
        }
    };
    html(body)
}

/// A form that fails to deserialize (blank or non-numeric field) gets the
/// prediction page back with the error box instead of a plain-text 400.
fn prediction_form_error(err: UrlencodedError, req: &HttpRequest) -> actix_web::Error {
    log::warn!("Rejected prediction form: {}", err);
    let user = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.user_login.clone())
        .unwrap_or_default();
    let message = err.to_string();
    let body = pages::prediction_page(&user, &PredictionForm::default(), PredictionView::Error(&message));
    let response = HttpResponse::BadRequest()
        .content_type("text/html; charset=utf-8")
        .body(body);
    InternalError::from_response(err, response).into()
}

async fn api_summary(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(&state.dashboard)
}

async fn api_predict(state: web::Data<AppState>, form: web::Json<PredictionForm>) -> HttpResponse {
    match predict_grade(&state.model, &state.encoders, &form) {
        Ok(prediction) => HttpResponse::Ok().json(prediction),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

async fn model_info(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.model.info())
}

async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().body(format!(
        "Student Performance Analytics is running with {} records",
        state.table.len()
    ))
}

async fn not_found(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(pages::not_found_page(&state.user_login, req.path()))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(dashboard))
        .route("/dashboard", web::get().to(dashboard))
        .route("/analysis", web::get().to(analysis))
        .service(
            web::resource("/prediction")
                .app_data(web::FormConfig::default().error_handler(prediction_form_error))
                .route(web::get().to(prediction_form))
                .route(web::post().to(submit_prediction)),
        )
        .service(
            web::scope("/api")
                .route("/summary", web::get().to(api_summary))
                .route("/predict", web::post().to(api_predict)),
        )
        .route("/model/info", web::get().to(model_info))
        .route("/health", web::get().to(health_check))
        .default_service(web::to(not_found));
}

pub async fn start_server(state: AppState, config: &AppConfig) -> std::io::Result<()> {
    let state = web::Data::new(state);
    let (host, port) = config.bind_addr();
    log::info!("Starting dashboard on http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(routes)
    })
    .bind((host, port))?
    .run()
    .await
}
