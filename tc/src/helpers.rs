//! Handlebars helpers available to every page template
//!
//! | Helper       | Usage                          | Output                         |
//! |--------------|--------------------------------|--------------------------------|
//! | `money`      | `{{money price_cents}}`        | `$34.99`                       |
//! | `date_fmt`   | `{{date_fmt date "%d %b"}}`    | chrono-formatted date          |
//! | `json`       | `{{json product}}`             | JSON, safe inside `<script>`   |
//! | `t`          | `{{t "add_to_cart" i18n}}`     | dictionary lookup or the key   |
//! | `url_encode` | `{{url_encode name}}`          | form-encoded string            |

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderErrorReason};
use serde_json::Value;
use tracing::debug;

/// Default currency symbol for `money`
pub const DEFAULT_CURRENCY: &str = "$";

/// Default chrono format for `date_fmt`
pub const DEFAULT_DATE_FORMAT: &str = "%b %d, %Y";

/// Register every helper on the given registry
pub fn register_helpers(hbs: &mut Handlebars<'static>) {
    debug!("register_helpers: called");
    hbs.register_helper("money", Box::new(money_helper));
    hbs.register_helper("date_fmt", Box::new(date_fmt_helper));
    hbs.register_helper("json", Box::new(json_helper));
    hbs.register_helper("t", Box::new(t_helper));
    hbs.register_helper("url_encode", Box::new(url_encode_helper));
}

/// Format an amount of cents with a currency symbol and thousands separators
pub fn format_money(cents: i64, symbol: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let whole = (abs / 100).to_string();
    let frac = abs % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{symbol}{grouped}.{frac:02}")
}

fn value_to_cents(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}

/// `{{money cents [symbol]}}`
pub fn money_helper(
    h: &Helper,
    r: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let cents = value_to_cents(h.param(0).map(|p| p.value()));
    let symbol = h.param(1).and_then(|p| p.value().as_str()).unwrap_or(DEFAULT_CURRENCY);
    out.write(&format_money(cents, &r.get_escape_fn()(symbol)))?;
    Ok(())
}

/// Parse RFC 3339 timestamps or plain `YYYY-MM-DD` dates (at midnight)
fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `{{date_fmt value [format]}}`
pub fn date_fmt_helper(
    h: &Helper,
    r: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let raw = match h.param(0).map(|p| p.value()) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    let fmt = h.param(1).and_then(|p| p.value().as_str()).unwrap_or(DEFAULT_DATE_FORMAT);

    if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
        return Err(RenderErrorReason::Other(format!("date_fmt: invalid format string '{}'", fmt)).into());
    }

    match parse_date(&raw) {
        Some(date) => {
            let mut formatted = String::new();
            write!(formatted, "{}", date.format(fmt))
                .map_err(|_| RenderErrorReason::Other(format!("date_fmt: cannot apply '{}' to {}", fmt, raw)))?;
            out.write(&formatted)?;
        }
        None => out.write(&r.get_escape_fn()(&raw))?,
    }
    Ok(())
}

/// Serialize a value as JSON with `<` escaped so it can sit inside a script tag
pub fn to_script_json(value: &Value) -> String {
    serde_json::to_string(value)
        .map(|s| s.replace('<', "\\u003c"))
        .unwrap_or_else(|_| "null".to_string())
}

/// `{{json value}}`
pub fn json_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let rendered = h
        .param(0)
        .map(|p| to_script_json(p.value()))
        .unwrap_or_else(|| "null".to_string());
    out.write(&rendered)?;
    Ok(())
}

/// `{{t key dict}}`: translate `key` through `dict`, falling back to the key
pub fn t_helper(h: &Helper, r: &Handlebars, _: &Context, _rc: &mut RenderContext, out: &mut dyn Output) -> HelperResult {
    let key = h
        .param(0)
        .and_then(|p| p.value().as_str())
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("t", 0))?;

    let translated = h
        .param(1)
        .and_then(|p| p.value().get(key))
        .and_then(Value::as_str)
        .unwrap_or(key);

    out.write(&r.get_escape_fn()(translated))?;
    Ok(())
}

/// Form-encode a string for use in a query parameter
pub fn url_encode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

/// `{{url_encode value}}`
pub fn url_encode_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let raw = match h.param(0).map(|p| p.value()) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    out.write(&url_encode(&raw))?;
    Ok(())
}
