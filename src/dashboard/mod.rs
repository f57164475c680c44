//! Dashboard controller: owns the main layout and both data clients, drives
//! the refresh timers and turns clicks into dialogs and light toggles

pub mod templates;

use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, warn};

use crate::constants::{forecast, intervals};
use crate::layout::{LayoutBuilder, LayoutError};
use crate::lights::Lights;
use crate::pretty::{
    pretty_date_only_str, pretty_date_str, pretty_temp, pretty_time_str, pretty_time_str_short, pretty_weekday,
};
use crate::timer::Interval;
use crate::toolkit::{Handle, Role, SizePolicy, TextBearing, Toolkit, Widget};
use crate::weather::{Alert, Precipitation, Weather};
use templates::{nest_under_last_line, scale_template, temperature_style, FORECAST_DAY, PERIOD_DETAIL};

/// Object name of every top-level panel, so the style sheet can target it
pub const TOP_LEVEL: &str = "top-level";

const LIGHT_ON_PROPERTY: &str = "light-on";
const NO_MORE_DATA: &str = "It is late and there is no more available data for today.";

/// Requests raised by click handlers, handled on the next frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardCommand {
    ToggleLight(String),
    /// Period details for a day; `None` is the rest of today
    ShowForecast(Option<NaiveDate>),
    ShowAlerts,
}

#[derive(Debug)]
pub enum DialogBody {
    Message(String),
    /// Widget tree shown in a scrollable area
    Widgets(Handle),
}

/// Modal window requested by the controller
#[derive(Debug)]
pub struct Dialog {
    pub title: String,
    pub body: DialogBody,
}

struct Timers {
    clock: Interval,
    weather: Interval,
    lights: Interval,
}

impl Timers {
    fn new(now: Instant) -> Self {
        Self {
            clock: Interval::from_secs(intervals::CLOCK_SECS, now),
            weather: Interval::from_secs(intervals::WEATHER_SECS, now),
            lights: Interval::from_secs(intervals::LIGHTS_SECS, now),
        }
    }
}

pub struct Dashboard {
    toolkit: Rc<Toolkit>,
    root: Handle,
    ui: LayoutBuilder,
    lights: Lights,
    weather: Weather,
    /// Light id to its button, in the order the controller reported them
    light_buttons: Vec<(String, Handle)>,
    commands: Sender<DashboardCommand>,
    pending: Receiver<DashboardCommand>,
    dialogs: Vec<Dialog>,
    timers: Timers,
}

impl Dashboard {
    /// Build the main layout from `layout` and show whatever data the
    /// clients already hold
    pub fn new(
        toolkit: Rc<Toolkit>,
        layout: &str,
        lights: Lights,
        weather: Weather,
        now: Instant,
    ) -> Result<Self> {
        let source = nest_under_last_line(
            layout,
            &scale_template(FORECAST_DAY, forecast::DAYS_SHOWN),
        );
        let root = top_level_panel();
        let ui = LayoutBuilder::new(toolkit.clone(), &root, &source)
            .context("Failed to build the dashboard layout")?;
        let (commands, pending) = mpsc::channel();

        let mut dashboard = Self {
            toolkit,
            root,
            ui,
            lights,
            weather,
            light_buttons: Vec::new(),
            commands,
            pending,
            dialogs: Vec::new(),
            timers: Timers::new(now),
        };
        dashboard.update_time()?;
        dashboard.sync_lights_ui()?;
        dashboard.update_weather_ui()?;
        info!(ui = ?dashboard.ui, "dashboard ready");
        Ok(dashboard)
    }

    pub fn root(&self) -> &Handle {
        &self.root
    }

    pub fn toolkit(&self) -> &Rc<Toolkit> {
        &self.toolkit
    }

    pub fn ui(&self) -> &LayoutBuilder {
        &self.ui
    }

    /// Dialogs requested since the last call
    pub fn take_dialogs(&mut self) -> Vec<Dialog> {
        std::mem::take(&mut self.dialogs)
    }

    /// Run queued commands and due timers. Layout errors here point at a
    /// defect in the notation and are logged rather than propagated.
    pub fn tick(&mut self, now: Instant) {
        while let Ok(command) = self.pending.try_recv() {
            debug!(?command, "handling dashboard command");
            let _ = self
                .handle_command(command)
                .inspect_err(|err| error!("failed to handle dashboard command: err={err:#}"));
        }

        if self.timers.clock.due(now) {
            let _ = self
                .update_time()
                .inspect_err(|err| error!("failed to update clock: err={err}"));
        }
        if self.timers.weather.due(now) {
            self.refresh_weather();
        }
        if self.timers.lights.due(now) {
            self.refresh_lights();
        }
    }

    /// How long the frame loop may sleep before the next timer is due
    pub fn next_wake(&self, now: Instant) -> Duration {
        [&self.timers.clock, &self.timers.weather, &self.timers.lights]
            .iter()
            .map(|timer| timer.remaining(now))
            .min()
            .unwrap_or(Duration::from_secs(intervals::CLOCK_SECS))
    }

    fn handle_command(&mut self, command: DashboardCommand) -> Result<()> {
        match command {
            DashboardCommand::ToggleLight(id) => {
                if let Err(err) = self.lights.toggle(&id) {
                    warn!(id = %id, error = %err, "failed to toggle light");
                }
                self.sync_lights_ui()?;
            }
            DashboardCommand::ShowForecast(day) => {
                let dialog = self.forecast_dialog(day)?;
                self.dialogs.push(dialog);
            }
            DashboardCommand::ShowAlerts => {
                let dialog = alerts_dialog(self.weather.alerts());
                self.dialogs.push(dialog);
            }
        }
        Ok(())
    }

    fn update_time(&self) -> Result<(), LayoutError> {
        let now = Local::now();
        self.ui.set_text(
            "clock-date",
            &format!("{} {}", pretty_weekday(&now), pretty_date_only_str(&now)),
        )?;
        self.ui.set_text("clock-time", &pretty_time_str(&now))
    }

    fn refresh_lights(&mut self) {
        if let Err(err) = self.lights.refresh(None) {
            warn!(error = %err, "failed to refresh lights, keeping previous state");
        }
        let _ = self
            .sync_lights_ui()
            .inspect_err(|err| error!("failed to update lights: err={err}"));
    }

    fn refresh_weather(&mut self) {
        if let Err(err) = self.weather.refresh() {
            warn!(error = %err, "failed to refresh weather, keeping previous report");
        }
        let _ = self
            .update_weather_ui()
            .inspect_err(|err| error!("failed to update weather: err={err}"));
    }

    /// Rebuild the light buttons when the set of lights changed, then show
    /// each light's state through the `light-on` property
    fn sync_lights_ui(&mut self) -> Result<(), LayoutError> {
        let lights = self.lights.lights();
        let unchanged = lights.len() == self.light_buttons.len()
            && lights
                .iter()
                .zip(&self.light_buttons)
                .all(|(light, (id, _))| light.id == *id);

        if !unchanged {
            let container = self.ui.by_id("lights-box")?;
            container.clear_items();
            self.light_buttons.clear();

            for light in lights {
                let button = Handle::new(Widget::button());
                {
                    let mut widget = button.borrow_mut();
                    widget.set_size_policy(SizePolicy::Expanding);
                    widget.set_object_name(&format!("light-{}", light.id));
                    if let Role::Button(inner) = widget.role_mut() {
                        inner.set_text(&light.name);
                    }
                    if let Some(clickable) = widget.clickable_mut() {
                        let commands = self.commands.clone();
                        let id = light.id.clone();
                        clickable.replace_click_handler(Rc::new(move || {
                            let _ = commands.send(DashboardCommand::ToggleLight(id.clone()));
                        }));
                    }
                }
                container.add_widget(button.clone());
                self.light_buttons.push((light.id.clone(), button));
            }
            debug!(count = self.light_buttons.len(), "rebuilt light buttons");
        }

        if lights.is_empty() {
            self.ui.show("lights-error")?;
            self.ui.hide("lights-container")?;
        } else {
            self.ui.hide("lights-error")?;
            self.ui.show("lights-container")?;
        }

        for (light, (_, button)) in lights.iter().zip(&self.light_buttons) {
            button
                .borrow_mut()
                .set_property(LIGHT_ON_PROPERTY, light.on.to_string());
            self.toolkit.restyle(button);
        }
        Ok(())
    }

    fn set_temperature(&self, id: &str, degrees: f64) -> Result<(), LayoutError> {
        self.ui.set_text(id, &pretty_temp(degrees))?;
        self.ui.set_stylesheet(id, &temperature_style(degrees))
    }

    /// Icons come from the download cache, which may be missing a file when
    /// a fetch failed; that only costs the picture
    fn set_icon(&self, id: &str, icon: &str, size: Option<u32>) -> Result<(), LayoutError> {
        match self.ui.set_icon(id, icon, size) {
            Err(err @ LayoutError::Icon { .. }) => {
                warn!(id, icon, error = %err, "weather icon unavailable");
                Ok(())
            }
            other => other,
        }
    }

    fn update_weather_ui(&self) -> Result<(), LayoutError> {
        let ui = &self.ui;
        ui.set_text(
            "weather-box",
            &format!("Weather for {}", self.weather.location_name()),
        )?;

        let Some(today) = self.weather.today() else {
            ui.set_text("updated-time", "weather unavailable")?;
            ui.hide("today-alert")?;
            for index in 0..forecast::DAYS_SHOWN {
                ui.hide(&format!("forecast-day-{index}-details"))?;
            }
            return Ok(());
        };

        if let Some(updated) = self.weather.updated() {
            ui.set_text("updated-time", &format!("last updated at {}", pretty_date_str(&updated)))?;
        }
        self.set_temperature("current-temperature", today.temp)?;
        self.set_temperature("today-low", today.low)?;
        self.set_temperature("today-high", today.high)?;
        ui.set_text("current-conditions", &today.condition.label())?;
        self.set_icon("current-icon", &today.condition.icon, None)?;
        self.bind_command("today-details", DashboardCommand::ShowForecast(None))?;

        let alerts = self.weather.alerts();
        if alerts.is_empty() {
            ui.hide("today-alert")?;
        } else {
            let plural = if alerts.len() > 1 { "s" } else { "" };
            ui.set_text("today-alert", &format!("{} active alert{plural}", alerts.len()))?;
            ui.show("today-alert")?;
            self.bind_command("today-alert", DashboardCommand::ShowAlerts)?;
        }

        let messages = self.weather.upcoming_precip_messages();
        for index in 0..2 {
            let message = messages.get(index).map_or("", String::as_str);
            ui.set_text(&format!("upcoming-{index}"), message)?;
        }

        // The first aggregate is today, already shown above
        let upcoming = self.weather.days().iter().skip(1);
        let mut shown = 0;
        for (index, day) in upcoming.take(forecast::DAYS_SHOWN).enumerate() {
            let prefix = format!("forecast-day-{index}");
            ui.set_text(&prefix, &day.weekday())?;
            ui.set_text(&format!("{prefix}-conditions"), &day.condition.label())?;
            self.set_temperature(&format!("{prefix}-low"), day.low)?;
            self.set_temperature(&format!("{prefix}-high"), day.high)?;
            self.set_icon(
                &format!("{prefix}-icon"),
                &day.condition.icon,
                Some(forecast::DAY_ICON_SIZE),
            )?;

            let lines = day.precip_lines();
            for slot in 0..Precipitation::ALL.len() {
                let line = lines.get(slot).map_or("", String::as_str);
                ui.set_text(&format!("{prefix}-precip-{slot}"), line)?;
            }

            self.bind_command(
                &format!("{prefix}-details"),
                DashboardCommand::ShowForecast(Some(day.date)),
            )?;
            ui.show(&format!("{prefix}-details"))?;
            shown += 1;
        }
        for index in shown..forecast::DAYS_SHOWN {
            ui.hide(&format!("forecast-day-{index}-details"))?;
        }
        Ok(())
    }

    /// Clicking `id` queues `command`; rebinding replaces the previous command
    fn bind_command(&self, id: &str, command: DashboardCommand) -> Result<(), LayoutError> {
        let commands = self.commands.clone();
        self.ui.on_click(id, move || {
            let _ = commands.send(command.clone());
        })
    }

    /// Period details for `day`, built with a scoped builder over a fresh row
    fn forecast_dialog(&self, day: Option<NaiveDate>) -> Result<Dialog> {
        let Some(periods) = self.weather.periods_by_day(day) else {
            return Ok(Dialog {
                title: "No more data".to_string(),
                body: DialogBody::Message(NO_MORE_DATA.to_string()),
            });
        };

        let row = Handle::new(Widget::hbox());
        let detail = LayoutBuilder::new(
            self.toolkit.clone(),
            &row,
            &scale_template(PERIOD_DETAIL, periods.len()),
        )
        .context("Failed to build the forecast detail layout")?;

        for (index, period) in periods.iter().enumerate() {
            detail.set_text(&format!("time-{index}"), &pretty_time_str_short(&period.time))?;
            let temp_id = format!("temp-{index}");
            detail.set_text(&temp_id, &pretty_temp(period.temp))?;
            detail.set_stylesheet(&temp_id, &temperature_style(period.temp))?;
            detail.set_text(&format!("conditions-{index}"), &period.condition.label())?;
            if let Err(err) = detail.set_icon(
                &format!("icon-{index}"),
                &period.condition.icon,
                Some(forecast::PERIOD_ICON_SIZE),
            ) {
                warn!(error = %err, "period icon unavailable");
            }

            for kind in Precipitation::ALL {
                let precip_id = format!("{}-{index}", kind.name().to_lowercase());
                match period.precip_text(kind) {
                    Some(text) => detail.set_text(&precip_id, &text)?,
                    None => detail.hide(&precip_id)?,
                }
            }
        }

        let name = match day {
            Some(date) => self
                .weather
                .days()
                .iter()
                .find(|aggregate| aggregate.date == date)
                .map(|aggregate| aggregate.weekday())
                .unwrap_or_else(|| date.to_string()),
            None => "Today".to_string(),
        };
        Ok(Dialog {
            title: format!("Weather for {name}"),
            body: DialogBody::Widgets(row),
        })
    }
}

fn top_level_panel() -> Handle {
    let mut panel = Widget::panel();
    panel.set_object_name(TOP_LEVEL);
    Handle::new(panel)
}

/// Headline and description of every active alert
fn alerts_dialog(alerts: &[Alert]) -> Dialog {
    let column = Handle::new(Widget::vbox());
    for alert in alerts {
        column.add_widget(wrapped_label(&alert.headline, true));
        column.add_widget(wrapped_label(&alert.description, false));
    }
    Dialog {
        title: "Weather Alert".to_string(),
        body: DialogBody::Widgets(column),
    }
}

fn wrapped_label(text: &str, header: bool) -> Handle {
    let mut widget = Widget::label();
    if let Role::Label(label) = widget.role_mut() {
        label.set_text(text);
        label.word_wrap = true;
    }
    if header {
        widget.set_property("header", "true");
    }
    Handle::new(widget)
}
