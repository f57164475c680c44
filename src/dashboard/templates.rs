//! Layout fragments instantiated per forecast day or period, and the
//! temperature colour scale

use crate::constants::temperature::{COLDEST, SCALE};
use crate::layout::notation::{indent_columns, COMMENT_MARKER, INDENT_WIDTH};

/// Placeholder replaced by the instance number
const INDEX: &str = "{i}";

/// One block per upcoming day, nested under the last line of the main layout
pub const FORECAST_DAY: &str = r"Button#forecast-day-{i}-details.forecast-day(expanding=true, style=height: 150px;)
    VBoxLayout
        Label#forecast-day-{i}.day-name
        Label#forecast-day-{i}-icon
        HBoxLayout
            Label#forecast-day-{i}-low.temperature
            Label -
            Label#forecast-day-{i}-high.temperature
            stretch
        Label#forecast-day-{i}-conditions
        // rain and snow lines fill from the top so a snow-only day leaves no gap
        Label#forecast-day-{i}-precip-0
        Label#forecast-day-{i}-precip-1
        stretch
";

/// One column per period in the detail dialog
pub const PERIOD_DETAIL: &str = r"GroupBox.period-detail(detail-group=true)
    VBoxLayout
        HBoxLayout
            Label#time-{i}.period-time
            Label#temp-{i}.temperature
        Label#icon-{i}
        Label#conditions-{i}
        Label#rain-{i}
        Label#snow-{i}
        stretch
";

/// Concatenate `times` copies of `template`, numbering each from zero
pub fn scale_template(template: &str, times: usize) -> String {
    (0..times)
        .map(|index| template.replace(INDEX, &index.to_string()))
        .collect()
}

/// Append `fragment` indented one level deeper than the last declaration in
/// `source`, so it becomes that declaration's children
pub fn nest_under_last_line(source: &str, fragment: &str) -> String {
    let last_depth = source
        .lines()
        .rev()
        .find(|line| {
            let trimmed = line.trim_start();
            !trimmed.is_empty() && !trimmed.starts_with(COMMENT_MARKER)
        })
        .map(|line| indent_columns(line) / INDENT_WIDTH);
    let indent = " ".repeat(last_depth.map_or(0, |depth| (depth + 1) * INDENT_WIDTH));

    let mut nested = source.trim_end().to_string();
    nested.push('\n');
    for line in fragment.lines() {
        if !line.trim().is_empty() {
            nested.push_str(&indent);
            nested.push_str(line);
        }
        nested.push('\n');
    }
    nested
}

/// Hex colour for a temperature in °F
pub fn temperature_color(degrees: f64) -> &'static str {
    SCALE
        .iter()
        .find(|(bound, _)| degrees > *bound)
        .map_or(COLDEST, |&(_, color)| color)
}

/// Inline style colouring a temperature label
pub fn temperature_style(degrees: f64) -> String {
    format!("color: #{};", temperature_color(degrees))
}
