//! Four-panel view of a run.
//!
//! See [`Figure`] for usage.

use eframe::egui;
use egui_plot::{HLine, Legend, Line, Plot, PlotPoints};
use wallflux_model::DiagnosticSample;

/// Configuration for rendering a [`Figure`].
///
/// Construct with [`ShowConfig::new`] and chain builder methods as needed.
pub struct ShowConfig {
    title: Option<String>,
    legend: bool,
}

impl ShowConfig {
    /// Creates a new `ShowConfig` with no title and no legend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: None,
            legend: false,
        }
    }

    /// Sets the window title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Enables a legend in each panel.
    #[must_use]
    pub fn legend(mut self) -> Self {
        self.legend = true;
        self
    }
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One panel: a named trace and an optional horizontal reference line.
#[derive(Debug, Clone, PartialEq)]
struct Panel {
    id: &'static str,
    label: &'static str,
    points: Vec<[f64; 2]>,
    marker: Option<(&'static str, f64)>,
}

/// Plasma inventory, wall inventory, return flux and `R_eff` against time.
///
/// # Example
///
/// ```ignore
/// let diagnostics = run.diagnostics(&scenario)?;
/// Figure::new(&diagnostics, capacity, scenario.near_unity_threshold)
///     .show(ShowConfig::new().title("wallflux").legend())?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    panels: [Panel; 4],
}

impl Figure {
    /// Collects the four traces from per-sample diagnostics.
    ///
    /// Samples without a defined `R_eff` are left out of the last panel.
    pub fn new(diagnostics: &[DiagnosticSample], wall_capacity: f64, near_unity: f64) -> Self {
        let trace = |f: fn(&DiagnosticSample) -> Option<f64>| {
            diagnostics
                .iter()
                .filter_map(|s| f(s).map(|y| [s.t, y]))
                .collect::<Vec<_>>()
        };

        Self {
            panels: [
                Panel {
                    id: "plasma",
                    label: "Np [particles]",
                    points: trace(|s| Some(s.plasma)),
                    marker: None,
                },
                Panel {
                    id: "wall",
                    label: "Nw [particles]",
                    points: trace(|s| Some(s.wall)),
                    marker: Some(("Nw_max", wall_capacity)),
                },
                Panel {
                    id: "return_flux",
                    label: "Return flux [particles/s]",
                    points: trace(|s| Some(s.return_flux)),
                    marker: None,
                },
                Panel {
                    id: "r_eff",
                    label: "R_eff",
                    points: trace(|s| s.r_eff),
                    marker: Some(("near-unity marker", near_unity)),
                },
            ],
        }
    }

    /// Opens a blocking egui window displaying the four panels.
    ///
    /// Blocks until the window is closed by the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the native window cannot be created.
    pub fn show(self, config: ShowConfig) -> Result<(), eframe::Error> {
        let options = eframe::NativeOptions::default();
        let title = config.title.unwrap_or_default();
        let panels = self.panels;

        eframe::run_native(
            &title,
            options,
            Box::new(move |_cc| {
                Ok(Box::new(FigureApp {
                    panels,
                    legend: config.legend,
                }))
            }),
        )
    }
}

/// The egui [`eframe::App`] that renders the panels.
struct FigureApp {
    panels: [Panel; 4],
    legend: bool,
}

impl eframe::App for FigureApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let spacing = ui.spacing().item_spacing.y;
            let height = (ui.available_height() - 3.0 * spacing) / 4.0;

            for (index, panel) in self.panels.iter().enumerate() {
                let mut plot = Plot::new(panel.id)
                    .height(height)
                    .y_axis_label(panel.label);
                if index == self.panels.len() - 1 {
                    plot = plot.x_axis_label("Time [s]");
                }
                if self.legend {
                    plot = plot.legend(Legend::default());
                }

                plot.show(ui, |plot_ui| {
                    let points: PlotPoints = panel.points.iter().copied().collect();
                    plot_ui.line(Line::new(points).name(panel.label));
                    if let Some((name, y)) = panel.marker {
                        plot_ui.hline(HLine::new(y).name(name));
                    }
                });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64, r_eff: Option<f64>) -> DiagnosticSample {
        DiagnosticSample {
            t,
            plasma: 1.0 + t,
            wall: 2.0 + t,
            incident_flux: 4.0,
            prompt_return: 3.0,
            release: 0.5,
            return_flux: 3.5,
            net_wall_flux: 0.0,
            r_eff,
            near_unity: false,
        }
    }

    #[test]
    fn collects_one_point_per_sample() {
        let figure = Figure::new(&[sample(0.0, Some(0.9)), sample(1.0, Some(0.95))], 10.0, 0.995);

        assert_eq!(figure.panels[0].points, [[0.0, 1.0], [1.0, 2.0]]);
        assert_eq!(figure.panels[1].points, [[0.0, 2.0], [1.0, 3.0]]);
        assert_eq!(figure.panels[2].points, [[0.0, 3.5], [1.0, 3.5]]);
        assert_eq!(figure.panels[3].points, [[0.0, 0.9], [1.0, 0.95]]);
    }

    #[test]
    fn skips_undefined_recycling() {
        let figure = Figure::new(&[sample(0.0, None), sample(1.0, Some(0.99))], 10.0, 0.995);
        assert_eq!(figure.panels[3].points, [[1.0, 0.99]]);
        assert_eq!(figure.panels[0].points.len(), 2);
    }

    #[test]
    fn marks_capacity_and_threshold() {
        let figure = Figure::new(&[], 1.15e23, 0.995);
        assert_eq!(figure.panels[1].marker, Some(("Nw_max", 1.15e23)));
        assert_eq!(figure.panels[3].marker, Some(("near-unity marker", 0.995)));
        assert!(figure.panels.iter().all(|p| p.points.is_empty()));
    }
}
