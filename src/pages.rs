use std::fmt::Write;

use crate::analytics::{DashboardData, TermStats};
use crate::charts::ChartSet;
use crate::prediction::{Education, Gender, GradePrediction, Outcome, ParentStatus, PredictionForm, YesNo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Analysis,
    Prediction,
}

impl Page {
    const ALL: [Page; 3] = [Page::Dashboard, Page::Analysis, Page::Prediction];

    fn nav_label(self) -> &'static str {
        match self {
            Page::Dashboard => "🏠 Dashboard",
            Page::Analysis => "📊 Analysis",
            Page::Prediction => "🔮 Prediction",
        }
    }

    fn path(self) -> &'static str {
        match self {
            Page::Dashboard => "/dashboard",
            Page::Analysis => "/analysis",
            Page::Prediction => "/prediction",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisTab {
    Performance,
    Demographics,
}

impl AnalysisTab {
    pub fn from_query(tab: Option<&str>) -> Self {
        match tab {
            Some("demographics") => AnalysisTab::Demographics,
            _ => AnalysisTab::Performance,
        }
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const STYLE: &str = r#"
    body { margin: 0; font-family: Arial, sans-serif; display: flex; min-height: 100vh;
        background: linear-gradient(-45deg, rgba(142, 68, 173, 0.3), rgba(46, 204, 113, 0.3), rgba(52, 152, 219, 0.3));
        background-size: 400% 400%; animation: gradient 15s ease infinite; }
    @keyframes gradient { 0% { background-position: 0% 50%; } 50% { background-position: 100% 50%; } 100% { background-position: 0% 50%; } }
    .sidebar { width: 230px; padding: 15px 0; border-radius: 0 20px 20px 0;
        background: linear-gradient(165deg, rgba(70, 130, 180, 0.85), rgba(255, 215, 0, 0.6), rgba(65, 105, 225, 0.85)); }
    .nav-header { background: rgba(255, 255, 255, 0.2); padding: 15px; border-radius: 15px; margin: 15px; }
    .nav-title { color: white; font-size: 28px; font-weight: 800; text-align: center; margin: 0; text-shadow: 2px 2px 4px rgba(0,0,0,0.2); }
    .nav-item { display: block; color: white; font-size: 16px; font-weight: 500; padding: 12px; margin: 8px 15px;
        border-radius: 15px; text-decoration: none; transition: all 0.3s ease; }
    .nav-item:hover { background: rgba(255, 255, 255, 0.2); transform: translateX(5px); }
    .nav-item.active { background: rgba(255, 255, 255, 0.3); }
    main { flex: 1; padding: 1rem 2rem; max-width: 98%; }
    .user { background-color: white; padding: 10px; border-radius: 5px; margin-bottom: 20px; text-align: right; font-size: 14px; color: #666; }
    .grid { display: grid; gap: 15px; }
    .cols-2 { grid-template-columns: 1fr 1fr; } .cols-3 { grid-template-columns: 1fr 1fr 1fr; } .cols-4 { grid-template-columns: repeat(4, 1fr); }
    .card { padding: 20px; border-radius: 10px; color: white; text-align: center; }
    .card h1 { font-size: 24px; margin: 0 0 8px 0; } .card p { font-size: 16px; margin: 0; }
    .term { background-color: #f8f9fa; padding: 20px; border-radius: 10px; border: 2px solid #e0e0e0; }
    .stat { background-color: white; padding: 10px; border-radius: 5px; text-align: center; margin-top: 10px; }
    .stat p { margin: 0; color: #666; } .stat h2 { margin: 5px 0; }
    .chart svg { width: 100%; height: auto; border-radius: 15px; }
    .tabs a { display: inline-block; padding: 8px 16px; margin-right: 6px; border-radius: 8px 8px 0 0; text-decoration: none; color: #2c3e50; }
    .tabs a.active { background: white; font-weight: bold; }
    fieldset { border: none; } label { display: block; margin: 10px 0 4px; font-weight: bold; }
    input[type=number], select { width: 100%; padding: 8px; border-radius: 10px; border: 1px solid #ddd; }
    .inline label { display: inline; font-weight: normal; margin-right: 12px; }
    button { background: #ff4b4b; color: white; padding: 12px 24px; border: none; border-radius: 8px; cursor: pointer; width: 100%; }
    .result { background-color: #f0f2f6; padding: 20px; border-radius: 10px; text-align: center; max-width: 600px; margin: 20px auto; }
    .metric { font-size: 36px; font-weight: bold; }
    .error { background: #f8d7da; color: #721c24; padding: 12px; border-radius: 5px; }
    .warning { background: #fff3cd; color: #856404; padding: 12px; border-radius: 5px; }
    .success { background: #d4edda; color: #155724; padding: 12px; border-radius: 5px; }
    .info { background: #d1ecf1; color: #0c5460; padding: 12px; border-radius: 5px; }
    .advice { text-align: left; }
"#;

fn layout(active: Page, user: &str, title: &str, body: &str) -> String {
    let mut nav = String::new();
    for page in Page::ALL {
        let class = if page == active { "nav-item active" } else { "nav-item" };
        let _ = write!(nav, r#"<a class="{class}" href="{}">{}</a>"#, page.path(), page.nav_label());
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title} | Student Performance Analytics</title>
    <style>{STYLE}</style>
</head>
<body>
    <aside class="sidebar">
        <div class="nav-header"><h2 class="nav-title">Navigation</h2></div>
        <nav>{nav}</nav>
    </aside>
    <main>
        <div class="user">User: {user}</div>
        {body}
    </main>
</body>
</html>"#,
        title = escape_html(title),
        user = escape_html(user),
    )
}

fn summary_card(color: &str, value: &str, caption: &str) -> String {
    format!(
        r#"<div class="card" style="background-color: {color}"><h1>{value}</h1><p>{caption}</p></div>"#
    )
}

fn term_card(stats: &TermStats, color: &str) -> String {
    format!(
        r#"<div class="term">
            <h3 style="text-align: center; color: {color}; margin-bottom: 15px;">{term}</h3>
            <div class="stat"><p>Average Grade</p><h2 style="color: #2c3e50;">{average:.1}</h2></div>
            <div class="stat"><p>Pass Rate</p><h2 style="color: #2c3e50;">{pass_rate:.1}%</h2></div>
            <div class="stat"><p>Failed Students</p><h2 style="color: #e74c3c;">{failed}</h2></div>
            <div class="stat"><p>Top Performers</p><h2 style="color: #f1c40f;">{top}</h2></div>
        </div>"#,
        term = stats.term,
        average = stats.average,
        pass_rate = stats.pass_rate,
        failed = stats.failed,
        top = stats.top_performers,
    )
}

pub fn dashboard_page(user: &str, data: &DashboardData) -> String {
    let s = &data.summary;
    let cards = [
        summary_card("#2ecc71", &s.total_students.to_string(), "Total Students"),
        summary_card("#3498db", &format!("{:.1}", s.overall_average), "Overall Average"),
        summary_card("#e74c3c", &s.passed_students.to_string(), "Passed Students"),
        summary_card("#f1c40f", &s.top_performers.to_string(), "Top Performers"),
    ]
    .concat();

    let term_colors = ["#3498db", "#2ecc71", "#9b59b6"];
    let terms: String = data
        .terms
        .iter()
        .zip(term_colors.iter().cycle())
        .map(|(stats, color)| term_card(stats, color))
        .collect();

    let body = format!(
        r#"<h1>🏠 Student Performance Dashboard</h1>
        <h3>📊 Overall Performance Summary</h3>
        <div class="grid cols-4">{cards}</div>
        <br>
        <h3>📝 Term-wise Performance</h3>
        <div class="grid cols-3">{terms}</div>"#
    );
    layout(Page::Dashboard, user, "Dashboard", &body)
}

pub fn analysis_page(user: &str, charts: &ChartSet, tab: AnalysisTab) -> String {
    let tab_link = |target: AnalysisTab, query: &str, label: &str| {
        let class = if target == tab { "active" } else { "" };
        format!(r#"<a class="{class}" href="/analysis?tab={query}">{label}</a>"#)
    };
    let tabs = format!(
        "{}{}",
        tab_link(AnalysisTab::Performance, "performance", "📈 Performance Analysis"),
        tab_link(AnalysisTab::Demographics, "demographics", "👥 Demographics"),
    );

    let content = match tab {
        AnalysisTab::Performance => format!(
            r#"<div class="grid cols-2">
                <div><div class="chart">{}</div><div class="chart">{}</div></div>
                <div><div class="chart">{}</div><div class="chart">{}</div></div>
            </div>"#,
            charts.grade_box, charts.final_grade_histogram, charts.average_trend, charts.pass_rate_bars
        ),
        AnalysisTab::Demographics => format!(
            r#"<div class="grid cols-2"><div class="chart">{}</div><div class="chart">{}</div></div>"#,
            charts.gender_pie, charts.age_histogram
        ),
    };

    let body = format!(r#"<h1>📊 Detailed Analysis</h1><div class="tabs">{tabs}</div>{content}"#);
    layout(Page::Analysis, user, "Analysis", &body)
}

fn radio_group<T: Copy + PartialEq>(name: &str, options: &[(T, &str)], selected: T) -> String {
    let mut out = String::from(r#"<div class="inline">"#);
    for (value, label) in options {
        let checked = if *value == selected { " checked" } else { "" };
        let _ = write!(
            out,
            r#"<label><input type="radio" name="{name}" value="{label}"{checked}> {label}</label>"#
        );
    }
    out.push_str("</div>");
    out
}

fn number_input(name: &str, label: &str, min: u32, max: u32, value: u32) -> String {
    format!(
        r#"<label for="{name}">{label}</label><input type="number" id="{name}" name="{name}" min="{min}" max="{max}" value="{value}">"#
    )
}

fn education_select(name: &str, label: &str, selected: Education) -> String {
    let options: String = Education::ALL
        .iter()
        .map(|level| {
            let sel = if *level == selected { " selected" } else { "" };
            format!(r#"<option value="{0}"{sel}>{0}</option>"#, level.label())
        })
        .collect();
    format!(r#"<label for="{name}">{label}</label><select id="{name}" name="{name}">{options}</select>"#)
}

/// What the prediction page shows under the form.
pub enum PredictionView<'a> {
    Empty,
    Result(&'a GradePrediction),
    Error(&'a str),
}

fn result_block(view: &PredictionView<'_>) -> String {
    match view {
        PredictionView::Empty => String::new(),
        PredictionView::Error(message) => format!(
            r#"<div class="result"><div class="error">Error making prediction: {}</div><br><div class="info">Please ensure all inputs are filled correctly.</div></div>"#,
            escape_html(message)
        ),
        PredictionView::Result(prediction) => {
            let class = match prediction.outcome {
                Outcome::BelowPassing => "error",
                Outcome::Average => "warning",
                Outcome::Excellent => "success",
            };
            let advice: String = prediction
                .advice
                .iter()
                .map(|line| format!("<li>{}</li>", escape_html(line)))
                .collect();
            format!(
                r#"<div class="result">
                    <div>Predicted Grade</div>
                    <div class="metric">{grade}/20</div>
                    <div class="{class}">{headline}</div>
                    <div class="advice"><p><strong>{title}</strong></p><ul>{advice}</ul></div>
                </div>"#,
                grade = prediction.grade,
                headline = escape_html(&prediction.headline),
                title = prediction.outcome.advice_title(),
            )
        }
    }
}

pub fn prediction_page(user: &str, form: &PredictionForm, view: PredictionView<'_>) -> String {
    let body = format!(
        r#"<h1>🔮 Grade Prediction</h1>
        <form method="post" action="/prediction">
            <div class="grid cols-3">
                <fieldset>
                    <h3>Basic Information</h3>
                    <label>Gender</label>{gender}
                    {age}
                    <h3>Academic</h3>
                    {term_1}
                    {term_2}
                </fieldset>
                <fieldset>
                    <h3>Family Background</h3>
                    {medu}
                    {fedu}
                    <label>Parents Status</label>{pstatus}
                </fieldset>
                <fieldset>
                    <h3>Additional Factors</h3>
                    {absences}
                    <label>Extra-curricular Activities</label>{activities}
                    <label>Internet Access at Home</label>{internet}
                </fieldset>
            </div>
            <div style="max-width: 300px; margin: 20px auto;"><button type="submit">Predict Grade</button></div>
        </form>
        {result}"#,
        gender = radio_group("gender", &[(Gender::Male, "Male"), (Gender::Female, "Female")], form.gender),
        age = number_input("age", "Age", 15, 22, form.age),
        term_1 = number_input("term_1", "Term 1 Grade", 0, 20, form.term_1),
        term_2 = number_input("term_2", "Term 2 Grade", 0, 20, form.term_2),
        medu = education_select("medu", "Mother's Education", form.medu),
        fedu = education_select("fedu", "Father's Education", form.fedu),
        pstatus = radio_group(
            "pstatus",
            &[(ParentStatus::Together, "Together"), (ParentStatus::Apart, "Apart")],
            form.pstatus
        ),
        absences = number_input("absences", "Number of Absences", 0, 93, form.absences),
        activities = radio_group("activities", &[(YesNo::Yes, "Yes"), (YesNo::No, "No")], form.activities),
        internet = radio_group("internet", &[(YesNo::Yes, "Yes"), (YesNo::No, "No")], form.internet),
        result = result_block(&view),
    );
    layout(Page::Prediction, user, "Prediction", &body)
}

pub fn not_found_page(user: &str, path: &str) -> String {
    let body = format!(
        r#"<h1>Page not found</h1><p>Nothing lives at <code>{}</code>. Pick a page from the navigation.</p>"#,
        escape_html(path)
    );
    layout(Page::Dashboard, user, "Not Found", &body)
}
