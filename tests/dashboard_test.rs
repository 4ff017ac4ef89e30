use actix_web::{http::StatusCode, test, web, App};
use std::path::PathBuf;

use student_analytics::analytics::{mean, round1};
use student_analytics::data::load_students;
use student_analytics::server::routes;
use student_analytics::prediction::PredictionForm;
use student_analytics::{AppConfig, AppState};

fn sample_config() -> AppConfig {
    AppConfig {
        data_path: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/students.csv"),
        user_login: "registrar".to_string(),
        ..AppConfig::default()
    }
}

fn sample_state() -> web::Data<AppState> {
    web::Data::new(AppState::load(&sample_config()).expect("sample data loads"))
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(App::new().app_data($state.clone()).configure(routes)).await
    };
}

#[actix_web::test]
async fn root_renders_dashboard() {
    let state = sample_state();
    let app = app!(state);
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("Student Performance Dashboard"));
    assert!(html.contains("User: registrar"));
}

#[actix_web::test]
async fn dashboard_shows_summary_cards() {
    let state = sample_state();
    let app = app!(state);
    let req = test::TestRequest::get().uri("/dashboard").to_request();
    let body = test::call_and_read_body(&app, req).await;
    let html = String::from_utf8(body.to_vec()).unwrap();

    assert!(html.contains("Student Performance Dashboard"));
    assert!(html.contains("User: registrar"));
    assert!(html.contains(&format!("<h1>{}</h1>", state.table.len())));
    assert!(html.contains("Term 3"));
}

#[actix_web::test]
async fn summary_average_matches_column_means() {
    let state = sample_state();
    let app = app!(state);
    let req = test::TestRequest::get().uri("/api/summary").to_request();
    let json: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    let table = load_students(sample_config().data_path).unwrap();
    let term_3 = table.numeric("Term_3").unwrap();
    let expected = round1(mean(term_3));
    assert_eq!(json["terms"][2]["average"].as_f64().unwrap(), expected);
    assert_eq!(json["summary"]["total_students"].as_u64().unwrap() as usize, table.len());
}

#[actix_web::test]
async fn analysis_tabs_render_their_charts() {
    let state = sample_state();
    let app = app!(state);

    let req = test::TestRequest::get().uri("/analysis").to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(html.contains("Detailed Analysis"));
    assert_eq!(html.matches("<svg").count(), 4);

    let req = test::TestRequest::get().uri("/analysis?tab=demographics").to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert_eq!(html.matches("<svg").count(), 2);
    assert!(html.contains("Gender Distribution"));
}

#[actix_web::test]
async fn prediction_form_submits_and_shows_grade() {
    let state = sample_state();
    let app = app!(state);
    let req = test::TestRequest::post()
        .uri("/prediction")
        .set_form([
            ("gender", "Female"),
            ("age", "17"),
            ("term_1", "16"),
            ("term_2", "17"),
            ("medu", "Degree"),
            ("fedu", "Secondary"),
            ("pstatus", "Together"),
            ("absences", "2"),
            ("activities", "Yes"),
            ("internet", "Yes"),
        ])
        .to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(html.contains("Predicted Grade"));
    assert!(html.contains("/20"));
}

#[actix_web::test]
async fn out_of_range_form_shows_error_message() {
    let state = sample_state();
    let app = app!(state);
    let req = test::TestRequest::post()
        .uri("/prediction")
        .set_form([
            ("gender", "Male"),
            ("age", "40"),
            ("term_1", "10"),
            ("term_2", "10"),
            ("medu", "Primary"),
            ("fedu", "Primary"),
            ("pstatus", "Apart"),
            ("absences", "0"),
            ("activities", "No"),
            ("internet", "No"),
        ])
        .to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(html.contains("Error making prediction"));
    assert!(html.contains("Please ensure all inputs are filled correctly."));
}

#[actix_web::test]
async fn api_prediction_is_intercept_plus_weighted_inputs() {
    let state = sample_state();
    let app = app!(state);
    let form = serde_json::json!({
        "gender": "Male", "age": 18, "term_1": 12, "term_2": 13,
        "medu": "Secondary", "fedu": "Primary", "pstatus": "Together",
        "absences": 4, "activities": "No", "internet": "Yes"
    });
    let req = test::TestRequest::post().uri("/api/predict").set_json(&form).to_request();
    let json: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    let info: serde_json::Value = {
        let req = test::TestRequest::get().uri("/model/info").to_request();
        test::call_and_read_body_json(&app, req).await
    };
    let raw = json["raw"].as_f64().unwrap();
    let grade = json["grade"].as_i64().unwrap();
    assert_eq!(grade, raw.round_ties_even() as i64);

    let parsed: PredictionForm = serde_json::from_value(form).unwrap();
    let features = parsed.to_features(&state.encoders);
    let coefficients = info["coefficients"].as_array().unwrap();
    assert_eq!(coefficients.len(), 10);
    let expected = coefficients.iter().fold(info["intercept"].as_f64().unwrap(), |acc, c| {
        let feature = c["feature"].as_str().unwrap();
        acc + c["weight"].as_f64().unwrap() * features.get(feature).copied().unwrap_or(0.0)
    });
    assert!((raw - expected).abs() < 1e-9, "raw {raw} vs {expected}");
}

#[actix_web::test]
async fn blank_form_field_shows_error_page() {
    let state = sample_state();
    let app = app!(state);
    let req = test::TestRequest::post()
        .uri("/prediction")
        .set_form([
            ("gender", "Female"),
            ("age", ""),
            ("term_1", "12"),
            ("term_2", "12"),
            ("medu", "Primary"),
            ("fedu", "Primary"),
            ("pstatus", "Together"),
            ("absences", "0"),
            ("activities", "No"),
            ("internet", "No"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("Error making prediction"));
    assert!(html.contains("Please ensure all inputs are filled correctly."));
    assert!(html.contains("User: registrar"));
}

#[actix_web::test]
async fn api_prediction_rejects_invalid_input() {
    let state = sample_state();
    let app = app!(state);
    let form = serde_json::json!({
        "gender": "Male", "age": 17, "term_1": 25, "term_2": 13,
        "medu": "Secondary", "fedu": "Primary", "pstatus": "Together",
        "absences": 4, "activities": "No", "internet": "Yes"
    });
    let req = test::TestRequest::post().uri("/api/predict").set_json(&form).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unknown_route_is_not_found() {
    let state = sample_state();
    let app = app!(state);
    let req = test::TestRequest::get().uri("/reports").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn missing_data_file_fails_to_load() {
    let config = AppConfig {
        data_path: PathBuf::from("data/absent.csv"),
        ..AppConfig::default()
    };
    assert!(AppState::load(&config).is_err());
}
