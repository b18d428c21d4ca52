//! Form page rendering
//!
//! The page is rebuilt from scratch on every request; nothing about a
//! previous prediction survives into the next render.

use crate::data::{Categorical, Diabetes, FormInputs, Sex, SliderSpec, Smoking, AGE, DBP, SBP};
use crate::models::{PredictionResult, EXTRAPOLATION_NOTE};
use serde::Serialize;
use tera::{Context, Tera};

/// Page title
pub const TITLE: &str = "STRIKE Stroke Risk Calculator";

const FORM_TEMPLATE: &str = "form.html";

/// Where the form is in its interaction cycle
#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
    /// Waiting for the user to press the predict button
    AwaitingInput,
    /// A prediction succeeded for the submitted inputs
    ResultDisplayed(PredictionResult),
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Widget {
    Slider {
        name: &'static str,
        label: &'static str,
        min: i32,
        max: i32,
        value: i32,
    },
    Select {
        name: &'static str,
        label: &'static str,
        options: Vec<&'static str>,
        selected: String,
    },
}

impl Widget {
    fn slider(spec: &SliderSpec, value: i32) -> Self {
        Widget::Slider {
            name: spec.name,
            label: spec.label,
            min: spec.min,
            max: spec.max,
            // Keep the thumb on the track even if a raw request sent junk
            value: value.clamp(spec.min, spec.max),
        }
    }

    fn select<C: Categorical>(label: &'static str, selected: &str) -> Self {
        Widget::Select {
            name: C::FIELD,
            label,
            options: C::labels(),
            selected: selected.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ResultView {
    one_year: String,
    ten_year: String,
}

#[derive(Serialize)]
struct PageView<'a> {
    title: &'static str,
    widgets: Vec<Widget>,
    result: Option<ResultView>,
    error: Option<&'a str>,
    note: &'static str,
}

/// Build the template registry
pub fn templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(FORM_TEMPLATE, include_str!("templates/form.html"))?;
    Ok(tera)
}

/// Render the form with the given widget values, state and optional error
pub fn render(
    tera: &Tera,
    inputs: &FormInputs,
    state: &FormState,
    error: Option<&str>,
) -> Result<String, tera::Error> {
    let widgets = vec![
        Widget::slider(&AGE, inputs.age),
        Widget::select::<Sex>("Sex", &inputs.sex),
        Widget::slider(&SBP, inputs.sbp),
        Widget::slider(&DBP, inputs.dbp),
        Widget::select::<Diabetes>("Diabetes", &inputs.diabetes),
        Widget::select::<Smoking>("Smoking Status", &inputs.smoking),
    ];

    let result = match state {
        FormState::AwaitingInput => None,
        FormState::ResultDisplayed(r) => Some(ResultView {
            one_year: r.one_year_display(),
            ten_year: r.ten_year_display(),
        }),
    };

    let view = PageView {
        title: TITLE,
        widgets,
        result,
        error,
        note: EXTRAPOLATION_NOTE,
    };

    tera.render(FORM_TEMPLATE, &Context::from_serialize(&view)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PatientFeatures;

    fn result(p: f64) -> PredictionResult {
        PredictionResult::from_probability(
            PatientFeatures {
                age: 60,
                sex: 1,
                sbp: 120,
                dbp: 80,
                diabetes: 0,
                smoking: 0,
            },
            p,
        )
    }

    #[test]
    fn test_awaiting_input_has_no_result() {
        let tera = templates().unwrap();
        let html = render(&tera, &FormInputs::default(), &FormState::AwaitingInput, None).unwrap();

        assert!(html.contains(TITLE));
        assert!(html.contains("Predict Stroke Risk"));
        assert!(html.contains(r#"name="age" min="18" max="100" step="1" value="60""#));
        assert!(html.contains(r#"<option value="Female" selected>"#));
        assert!(!html.contains("Predicted 1-year stroke risk"));
        assert!(!html.contains("<details>"));
    }

    #[test]
    fn test_result_displayed() {
        let tera = templates().unwrap();
        let inputs = FormInputs {
            sex: "Male".to_string(),
            ..FormInputs::default()
        };
        let html = render(&tera, &inputs, &FormState::ResultDisplayed(result(0.05)), None).unwrap();

        assert!(html.contains("Predicted 1-year stroke risk: 5.00%"));
        assert!(html.contains("Estimated 10-year stroke risk: 40.13%"));
        assert!(html.contains("<details>"));
        assert!(html.contains("Framingham"));
        assert!(html.contains(r#"<option value="Male" selected>"#));
    }

    #[test]
    fn test_error_is_escaped() {
        let tera = templates().unwrap();
        let html = render(
            &tera,
            &FormInputs::default(),
            &FormState::AwaitingInput,
            Some("Unrecognized category for sex: \"<b>\""),
        )
        .unwrap();

        assert!(html.contains("Unrecognized category"));
        assert!(!html.contains("<b>"));
    }
}
