use nalgebra::{Rotation3, Vector3};
use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine, Points},
        Block, BorderType, Borders, Cell, Gauge, List, ListItem, Paragraph, Row, Sparkline, Table,
        Tabs, Wrap,
    },
};

use crate::core::domain::{Configuration, Variant};
use crate::core::sphere;
use crate::engine::evaluator::Direction as Goal;
use crate::interface::state::{AppMode, AppState, WorkerStatus};

// --- Color Palette ---
const COL_BG: Color = Color::Reset;
const COL_FG: Color = Color::White;
const COL_HIGHLIGHT: Color = Color::Yellow;
const COL_ACCENT: Color = Color::Cyan;
const COL_FRONT: Color = Color::LightCyan;
const COL_BACK: Color = Color::DarkGray;
const COL_OUTLINE: Color = Color::Gray;
const COL_CLOSEST: Color = Color::LightRed;
const COL_SUCCESS: Color = Color::Green;
const COL_FAIL: Color = Color::Red;
const COL_HEADER: Color = Color::Magenta;
const COL_ACCEPT: Color = Color::LightGreen;

pub fn draw(f: &mut Frame, app: &mut AppState) {
    if f.area().width < 40 || f.area().height < 10 {
        let p = Paragraph::new("Terminal too small.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(p, f.area());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    draw_header(f, app, chunks[0]);

    match app.mode {
        AppMode::Dashboard => draw_dashboard(f, app, chunks[1]),
        AppMode::Parameters => draw_parameters(f, app, chunks[1]),
        AppMode::BestHistory => draw_best_history(f, app, chunks[1]),
        AppMode::Viewer => draw_fullscreen_viewer(f, app, chunks[1]),
    }

    draw_footer(f, app, chunks[2]);
}

fn draw_header(f: &mut Frame, app: &AppState, area: Rect) {
    let titles = vec![" 1:Dash ", " 2:Params ", " 3:Best ", " 4:Viewer "];
    let idx = match app.mode {
        AppMode::Dashboard => 0,
        AppMode::Parameters => 1,
        AppMode::BestHistory => 2,
        AppMode::Viewer => 3,
    };

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::BOTTOM))
        .select(idx)
        .highlight_style(Style::default().fg(COL_HIGHLIGHT).add_modifier(Modifier::BOLD));

    f.render_widget(tabs, area);
}

fn draw_footer(f: &mut Frame, app: &AppState, area: Rect) {
    let status_str = match app.worker_status {
        WorkerStatus::Running => "RUNNING",
        WorkerStatus::Idle => "IDLE",
        WorkerStatus::Starting => "STARTING",
        WorkerStatus::Cancelling => "STOPPING",
        WorkerStatus::Finished => "DONE",
    };

    let color = match app.worker_status {
        WorkerStatus::Running => COL_SUCCESS,
        WorkerStatus::Cancelling => COL_FAIL,
        _ => COL_FG,
    };

    let best = app
        .best_objective()
        .map_or_else(|| "-".to_string(), |b| format!("{:.5}", b));

    let text = Line::from(vec![
        Span::styled(
            format!(" STATUS: {:<8}", status_str),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::raw(format!("Elapsed: {:.1}s", app.start_time.elapsed().as_secs_f64())),
        Span::raw(" | "),
        Span::styled(format!("Best: {}", best), Style::default().fg(COL_ACCENT)),
        Span::raw(" | [Q]uit [A]uto-rotate [R]eset-View"),
    ]);

    let p = Paragraph::new(text).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(p, area);
}

fn draw_dashboard(f: &mut Frame, app: &AppState, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let left_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(cols[0]);

    if let Some(config) = &app.active {
        draw_sphere(f, app, left_rows[0], config, " Best Configuration ");
    } else {
        f.render_widget(
            Block::default().title(" Waiting for Data... ").borders(Borders::ALL),
            left_rows[0],
        );
    }

    draw_schedule_charts(f, app, left_rows[1]);

    let right_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Percentage(20),
            Constraint::Percentage(30),
        ])
        .split(cols[1]);

    draw_logs(f, app, right_rows[0]);
    draw_gauges(f, app, right_rows[1]);
    draw_stats(f, app, right_rows[2]);
}

/// Orthographic projection of the configuration with the closest pair
/// highlighted.
fn draw_sphere(f: &mut Frame, app: &AppState, area: Rect, config: &Configuration, title: &str) {
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    if inner_area.width < 1 || inner_area.height < 1 || config.is_empty() {
        return;
    }

    let rot_y = Rotation3::from_axis_angle(&Vector3::y_axis(), app.viewport.azimuth);
    let rot_x = Rotation3::from_axis_angle(&Vector3::x_axis(), app.viewport.elevation);
    let view = rot_x * rot_y;
    let projected: Vec<Vector3<f64>> = config.points().iter().map(|p| view * p).collect();

    if projected.iter().any(|p| p.iter().any(|c| c.is_nan())) {
        f.render_widget(
            Paragraph::new("Error: NaN Coordinates").style(Style::default().fg(COL_FAIL)),
            inner_area,
        );
        return;
    }

    let front: Vec<(f64, f64)> = projected.iter().filter(|p| p.z >= 0.0).map(|p| (p.x, p.y)).collect();
    let back: Vec<(f64, f64)> = projected.iter().filter(|p| p.z < 0.0).map(|p| (p.x, p.y)).collect();
    let closest = sphere::select_closest_pair(config).map(|(i, j)| (projected[i], projected[j]));

    // Terminal cells are roughly twice as tall as wide.
    let aspect = (inner_area.width as f64 / (2.0 * inner_area.height as f64)).max(1e-3);
    let bound = 1.2;

    let canvas = Canvas::default()
        .background_color(COL_BG)
        .x_bounds([-bound * aspect.max(1.0), bound * aspect.max(1.0)])
        .y_bounds([-bound / aspect.min(1.0), bound / aspect.min(1.0)])
        .paint(|ctx| {
            ctx.draw(&Circle {
                x: 0.0,
                y: 0.0,
                radius: 1.0,
                color: COL_OUTLINE,
            });
            ctx.draw(&Points {
                coords: &back,
                color: COL_BACK,
            });
            ctx.layer();
            if let Some((a, b)) = closest {
                ctx.draw(&CanvasLine {
                    x1: a.x,
                    y1: a.y,
                    x2: b.x,
                    y2: b.y,
                    color: COL_CLOSEST,
                });
            }
            ctx.draw(&Points {
                coords: &front,
                color: COL_FRONT,
            });
        });

    f.render_widget(canvas, inner_area);

    let rot_status = if app.viewport.auto_rotate { "Auto-Rot: ON" } else { "Auto-Rot: OFF" };
    let overlay = Paragraph::new(rot_status)
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
    let overlay_area = Rect {
        x: inner_area.x + inner_area.width.saturating_sub(14),
        y: inner_area.y,
        width: 14.min(inner_area.width),
        height: 1,
    };
    f.render_widget(overlay, overlay_area);
}

/// Maps the most recent `width` samples onto 0..=10 bars.
fn sparkline_data(history: impl DoubleEndedIterator<Item = f64>, width: usize, min: f64, max: f64) -> Vec<u64> {
    let range = (max - min).max(1e-9);
    let mut data: Vec<u64> = history
        .rev()
        .take(width)
        .map(|v| if v.is_finite() { (((v - min) / range).clamp(0.0, 1.0) * 10.0) as u64 } else { 0 })
        .collect();
    data.reverse();
    data
}

fn draw_schedule_charts(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().title(" Schedule ").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(inner);

    let width = inner.width as usize;

    if !app.telemetry.objective_history.is_empty() {
        let data = sparkline_data(
            app.telemetry.objective_history.iter().map(|(_, o)| *o),
            width,
            app.telemetry.objective_min,
            app.telemetry.objective_max,
        );
        let spark = Sparkline::default()
            .block(Block::default().title(app.objective.name()).borders(Borders::NONE))
            .style(Style::default().fg(COL_ACCENT))
            .data(&data);
        f.render_widget(spark, chunks[0]);
    }

    if !app.telemetry.acceptance_history.is_empty() {
        let data = sparkline_data(app.telemetry.acceptance_history.iter().map(|(_, a)| *a), width, 0.0, 100.0);
        let spark = Sparkline::default()
            .block(Block::default().title("Acceptance Rate").borders(Borders::NONE))
            .style(Style::default().fg(COL_ACCEPT))
            .data(&data);
        f.render_widget(spark, chunks[1]);
    }

    if !app.telemetry.temperature_history.is_empty() {
        let data = sparkline_data(
            app.telemetry.temperature_history.iter().map(|(_, t)| *t),
            width,
            app.params.min_temperature,
            app.params.initial_temperature,
        );
        let spark = Sparkline::default()
            .block(Block::default().title("Temperature Schedule").borders(Borders::NONE))
            .style(Style::default().fg(COL_HIGHLIGHT))
            .data(&data);
        f.render_widget(spark, chunks[2]);
    }
}

fn draw_logs(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().title(" Log ").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let items: Vec<ListItem> = app
        .logs
        .iter()
        .rev()
        .map(|line| {
            let lower = line.to_lowercase();
            let style = if lower.contains("error") || lower.contains("unavailable") {
                Style::default().fg(COL_FAIL)
            } else if line.contains(">>>") {
                Style::default().fg(COL_SUCCESS)
            } else {
                Style::default().fg(Color::Gray)
            };

            ListItem::new(Line::from(vec![
                Span::styled(">", Style::default().fg(Color::DarkGray)),
                Span::raw(" "),
                Span::raw(line.as_str()),
            ]))
            .style(style)
        })
        .collect();

    f.render_widget(List::new(items), inner);
}

fn draw_gauges(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().title(" Progress ").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1); 2])
        .split(inner);

    let ratio = app.progress();
    let g_levels = Gauge::default()
        .gauge_style(Style::default().fg(COL_ACCENT).bg(Color::DarkGray))
        .ratio(ratio)
        .label(format!("Levels: {}/{}", app.levels_done(), app.scheduled_levels));
    f.render_widget(g_levels, layout[0]);

    let acc = app.last_level.as_ref().map_or(0.0, |l| l.acceptance_rate());
    let g_acc = Gauge::default()
        .gauge_style(Style::default().fg(COL_ACCEPT).bg(Color::DarkGray))
        .ratio(acc.clamp(0.0, 1.0))
        .label(format!("Accepted: {:.0}%", acc * 100.0));
    f.render_widget(g_acc, layout[1]);
}

fn draw_stats(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().title(" Statistics ").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let kv = |k: &str, v: String, color: Color| {
        Line::from(vec![
            Span::styled(k.to_string(), Style::default().fg(Color::Gray)),
            Span::styled(v, Style::default().fg(color)),
        ])
    };

    let (temperature, variance, iteration) = app
        .last_level
        .as_ref()
        .map_or((app.params.initial_temperature, 0.0, 0), |l| (l.temperature, l.variance, l.iteration));

    let min_angle = app
        .best_history
        .last()
        .and_then(|b| b.min_angle_deg)
        .map_or_else(|| "-".to_string(), |a| format!("{:.3}°", a));

    let goal = match app.direction() {
        Goal::Maximize => "maximise",
        Goal::Minimize => "minimise",
    };

    let text = vec![
        kv("Variant: ", format!("{:?} ({})", app.params.variant, goal), COL_HIGHLIGHT),
        kv("Iteration: ", iteration.to_string(), COL_HIGHLIGHT),
        kv("Temperature: ", format!("{:.5}", temperature), COL_HIGHLIGHT),
        kv("Variance: ", format!("{:.5}", variance), COL_HIGHLIGHT),
        kv("Min Angle: ", min_angle, COL_SUCCESS),
    ];

    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
}

fn draw_parameters(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Run Parameters ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let p = &app.params;

    let kv = |k: &str, v: String| -> ListItem {
        ListItem::new(Line::from(vec![
            Span::styled(format!("{:<20}", k), Style::default().fg(COL_ACCENT)),
            Span::raw(v),
        ]))
    };

    let variant = match p.variant {
        Variant::Distance => "distance (random walk, maximise sum distance)",
        Variant::Closeness => "closeness (closest-pair repulsion)",
        Variant::Energy => "energy (random walk, minimise Riesz energy)",
    };

    let mut items = vec![
        kv("Points:", p.point_count.to_string()),
        kv("Initial layout:", format!("{:?}", p.layout)),
        kv("Seed:", p.seed.to_string()),
        ListItem::new(Line::from(" ")),
        kv("Variant:", variant.to_string()),
        kv("Objective:", app.objective.name().to_string()),
        ListItem::new(Line::from(" ")),
        kv("Initial temperature:", format!("{}", p.initial_temperature)),
        kv("Damping:", format!("{}", p.damping)),
        kv("Temperature floor:", format!("{}", p.min_temperature)),
        kv("Iterations / level:", p.inner_iterations.to_string()),
        kv("Scheduled levels:", app.scheduled_levels.to_string()),
    ];

    if let Some(r) = &app.final_report {
        items.push(ListItem::new(Line::from(" ")));
        items.push(kv("Sum distance:", format!("{:.6}", r.sum_distance)));
        items.push(kv("Riesz energy:", format!("{:.6}", r.riesz_energy)));
        if let Some(a) = r.min_angle_deg {
            items.push(kv("Min separation:", format!("{:.4}°", a)));
        }
    }

    f.render_widget(List::new(items).block(Block::default().borders(Borders::NONE)), inner);
}

fn draw_best_history(f: &mut Frame, app: &mut AppState, area: Rect) {
    let header_cells = ["#", "Iteration", "Objective", "Min Angle"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(COL_HEADER)));
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    if app.best_history.is_empty() {
        f.render_widget(
            Paragraph::new("Waiting for the first snapshot...")
                .block(Block::default().borders(Borders::ALL).title(" Best Snapshots "))
                .alignment(Alignment::Center),
            area,
        );
        return;
    }

    let rows = app.best_history.iter().enumerate().map(|(i, b)| {
        Row::new(vec![
            Cell::from(format!("{}", i + 1)),
            Cell::from(b.iteration.to_string()),
            Cell::from(format!("{:.6}", b.objective)),
            Cell::from(b.min_angle_deg.map_or_else(|| "-".to_string(), |a| format!("{:.3}°", a))),
        ])
        .height(1)
    });

    let t = Table::new(
        rows,
        &[
            Constraint::Length(5),
            Constraint::Length(12),
            Constraint::Length(16),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Best Snapshots ({}) [j/k] ", app.best_history.len())),
    )
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(t, area, &mut app.best_state);
}

fn draw_fullscreen_viewer(f: &mut Frame, app: &AppState, area: Rect) {
    if let Some(config) = &app.active {
        draw_sphere(f, app, area, config, " Sphere Viewer (Fullscreen) ");
    } else {
        let p = Paragraph::new("No configuration yet.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(p, area);
    }
}
