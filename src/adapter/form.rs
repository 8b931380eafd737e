//! Login form discovery and login outcome detection

use crate::extract::collapse_whitespace;
use crate::fetch::{FetchRequest, FetchResponse};
use crate::model::Credential;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A login form found on a portal page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Raw `action` attribute, if any
    pub action: Option<String>,

    /// Upper-cased `method` attribute (POST when absent)
    pub method: String,

    /// Hidden inputs to echo back with the credential
    pub hidden_fields: Vec<(String, String)>,

    /// Names of the visible inputs
    pub field_names: Vec<String>,
}

impl LoginForm {
    /// True when the form submits its fields in the query string
    pub fn submits_with_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// Names from `wanted` that the form has no visible input for
    pub fn missing_fields<'a>(&self, wanted: &[&'a str]) -> Vec<&'a str> {
        wanted
            .iter()
            .copied()
            .filter(|name| !self.field_names.iter().any(|field| field == name))
            .collect()
    }
}

/// Finds the login form of a page
///
/// Prefers the first form holding a password input and falls back to the
/// first form of the page. Returns `None` when the page has no form.
pub fn parse_login_form(html: &str) -> Option<LoginForm> {
    let document = Html::parse_document(html);
    let form_selector = Selector::parse("form").ok()?;
    let password_selector = Selector::parse("input[type=password]").ok()?;
    let input_selector = Selector::parse("input[name]").ok()?;

    let forms: Vec<ElementRef<'_>> = document.select(&form_selector).collect();
    let form = forms
        .iter()
        .find(|form| form.select(&password_selector).next().is_some())
        .or_else(|| forms.first())?;

    let mut login_form = LoginForm {
        action: form
            .value()
            .attr("action")
            .map(str::trim)
            .filter(|action| !action.is_empty())
            .map(str::to_string),
        method: form
            .value()
            .attr("method")
            .map(|method| method.trim().to_ascii_uppercase())
            .filter(|method| !method.is_empty())
            .unwrap_or_else(|| "POST".to_string()),
        ..LoginForm::default()
    };

    for input in form.select(&input_selector) {
        let Some(name) = input.value().attr("name") else {
            continue;
        };
        let kind = input.value().attr("type").unwrap_or("text");

        if kind.eq_ignore_ascii_case("hidden") {
            let value = input.value().attr("value").unwrap_or_default();
            login_form
                .hidden_fields
                .push((name.to_string(), value.to_string()));
        } else {
            login_form.field_names.push(name.to_string());
        }
    }

    Some(login_form)
}

/// Fields to submit: the hidden inputs followed by the credential
///
/// Hidden inputs named like a credential field are dropped so the
/// credential is sent once.
pub fn login_fields(
    hidden_fields: &[(String, String)],
    username_field: &str,
    password_field: &str,
    credential: &Credential,
) -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = hidden_fields
        .iter()
        .filter(|(name, _)| name != username_field && name != password_field)
        .cloned()
        .collect();
    fields.push((
        username_field.to_string(),
        credential.identifier.trim().to_string(),
    ));
    fields.push((password_field.to_string(), credential.secret.clone()));
    fields
}

/// Builds the request that submits `credential` through a login page
///
/// The form action resolves against the page URL; `fallback_action` is used
/// when the page has no form or the action does not resolve. GET forms send
/// the fields in the query string, everything else is a form POST.
pub fn login_request(
    login_page: &FetchResponse,
    fallback_action: &Url,
    username_field: &str,
    password_field: &str,
    credential: &Credential,
) -> FetchRequest {
    let form = match parse_login_form(&login_page.body) {
        Some(form) => {
            for field in form.missing_fields(&[username_field, password_field]) {
                tracing::warn!(
                    url = %login_page.final_url,
                    field,
                    "Login form has no input for configured field"
                );
            }
            form
        }
        None => {
            tracing::warn!(url = %login_page.final_url, "Login page has no form");
            LoginForm::default()
        }
    };

    let mut action = form
        .action
        .as_deref()
        .and_then(|action| login_page.final_url.join(action).ok())
        .unwrap_or_else(|| fallback_action.clone());
    let fields = login_fields(&form.hidden_fields, username_field, password_field, credential);

    let request = if form.submits_with_get() {
        action.query_pairs_mut().extend_pairs(fields.iter());
        FetchRequest::get(action)
    } else {
        FetchRequest::post_form(action, fields)
    };

    request.with_header("Referer", login_page.final_url.as_str())
}

/// Inspects the page returned by a login POST
///
/// Returns the rejection reason when the login did not take:
/// - The text of any element whose class mentions "error"
/// - Otherwise a generic reason when the login form is still on the page
pub fn login_rejection(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    if let Some(message) = error_message(&document) {
        return Some(message);
    }

    let still_on_login = ["input[type=password]", "form#loginForm"]
        .iter()
        .filter_map(|selector| Selector::parse(selector).ok())
        .any(|selector| document.select(&selector).next().is_some());

    if still_on_login {
        Some("login form still present after submitting credentials".to_string())
    } else {
        None
    }
}

/// True when the page contains an input named `name`
pub fn has_input(html: &str, name: &str) -> bool {
    let document = Html::parse_document(html);
    match Selector::parse(&format!("input[name=\"{}\"]", name)) {
        Ok(selector) => document.select(&selector).next().is_some(),
        Err(_) => false,
    }
}

/// Text of the first non-empty element whose class mentions "error"
fn error_message(document: &Html) -> Option<String> {
    let selector = Selector::parse("[class]").ok()?;

    document
        .select(&selector)
        .filter(|element| {
            element
                .value()
                .attr("class")
                .map_or(false, |class| class.to_ascii_lowercase().contains("error"))
        })
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .find(|text| !text.is_empty())
}
