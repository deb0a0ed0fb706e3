use crate::app::App;
use luckydraw_core::{LotteryStatus, LotteryStore, Rgba, Stage, Viewport};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Color, Line, Modifier, Style, Stylize};
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Points, Rectangle};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

/// Vertical field of view of the stage camera.
const FOV_DEGREES: f64 = 40.0;
const NEAR_PLANE: f64 = 1.0;

/// A slot centre on screen: viewport-centred coordinates (y up) and the
/// perspective factor at its depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

pub fn project(stage: &Stage, idx: usize, viewport: Viewport) -> Option<Projected> {
    let world = stage.world_position(idx)?;
    let camera = stage.camera.position;
    let depth = camera.z - world.z;
    if depth <= NEAR_PLANE {
        return None;
    }
    let focal = (viewport.height / 2.0) / (FOV_DEGREES.to_radians() / 2.0).tan();
    let scale = focal / depth;
    Some(Projected {
        x: (world.x - camera.x) * scale,
        y: (world.y - camera.y) * scale,
        scale,
    })
}

fn rgb(color: &Rgba) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

pub fn draw(frame: &mut Frame, app: &App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(12),
            Constraint::Length(8),
        ])
        .split(frame.area());

    draw_header(frame, root[0], app);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(72), Constraint::Percentage(28)])
        .split(root[1]);
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(middle[1]);

    draw_stage(frame, middle[0], app);
    draw_winners(frame, side[0], app);
    draw_prizes(frame, side[1], app);
    draw_events(frame, root[2], app);

    if app.show_help {
        draw_help_popup(frame, app);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let status = app.locale.status(session.status());
    let title = format!(
        "{} | {}: {} | {}: {}",
        app.locale.text("Lucky Draw", "幸运抽奖"),
        app.locale.text("Status", "状态"),
        status,
        app.locale.text("Prize", "奖项"),
        app.current_prize_label()
    );
    let summary = format!(
        "{} {} | {} {} | {} {} | {} {}s",
        app.locale.text("Pool", "奖池"),
        session.store().remaining_pool().len(),
        app.locale.text("Winners", "中奖"),
        session.store().winners().count(),
        app.locale.text("Seed", "种子"),
        app.seed,
        app.locale.text("Clock", "时钟"),
        session.now() / 1000
    );
    let lines = vec![
        Line::from(title.bold()),
        Line::from(summary),
        Line::from(app.status_line.clone()),
    ];
    let block = Block::default().borders(Borders::TOP);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_stage(frame: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let stage = session.stage();
    let viewport = session.config.viewport;
    let half_w = viewport.width / 2.0;
    let half_h = viewport.height / 2.0;
    let revealed = session.status() == LotteryStatus::End;
    let text_color = rgb(&session.config.display.text_style().color);

    let mut idle: Vec<(Color, (f64, f64))> = Vec::new();
    let mut lucky = Vec::new();
    for slot in &stage.slots {
        if !slot.visible {
            continue;
        }
        let Some(point) = project(stage, slot.index, viewport) else {
            continue;
        };
        if slot.visual.lucky_class {
            lucky.push((slot, point));
        } else {
            idle.push((rgb(&slot.visual.background), (point.x, point.y)));
        }
    }
    let particles: Vec<(Color, (f64, f64))> = session
        .confetti()
        .particles()
        .iter()
        .map(|particle| {
            (
                rgb(&Rgba::from_hex(&particle.color, 1.0)),
                ((particle.x - 0.5) * viewport.width, (0.5 - particle.y) * viewport.height),
            )
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.locale.text("Stage", "舞台"));
    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([-half_w, half_w])
        .y_bounds([-half_h, half_h])
        .paint(move |ctx| {
            for (color, coord) in &idle {
                ctx.draw(&Points {
                    coords: std::slice::from_ref(coord),
                    color: *color,
                });
            }
            ctx.layer();
            for (slot, point) in &lucky {
                let width = slot.visual.size.width * point.scale;
                let height = slot.visual.size.height * point.scale;
                ctx.draw(&Rectangle {
                    x: point.x - width / 2.0,
                    y: point.y - height / 2.0,
                    width,
                    height,
                    color: rgb(&slot.visual.background),
                });
                if revealed {
                    ctx.print(
                        point.x - width / 2.0,
                        point.y,
                        Line::from(slot.visual.display_name()).fg(text_color).bold(),
                    );
                }
            }
            ctx.layer();
            for (color, coord) in &particles {
                ctx.draw(&Points {
                    coords: std::slice::from_ref(coord),
                    color: *color,
                });
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_winners(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem<'_>> = match app.session.round() {
        Some(round) if app.session.status() == LotteryStatus::End => round
            .winners
            .iter()
            .map(|winner| {
                ListItem::new(format!(
                    "{} {} {}",
                    winner.uid, winner.name, winner.department
                ))
            })
            .collect(),
        _ => Vec::new(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.locale.text("This round", "本轮中奖"));
    frame.render_widget(List::new(items).block(block), area);
}

fn draw_prizes(frame: &mut Frame, area: Rect, app: &App) {
    let store = app.session.store();
    let current = store.current_prize_id.as_deref();
    let mut prizes: Vec<_> = store.prizes.iter().collect();
    prizes.sort_by_key(|prize| prize.sort);
    let items: Vec<ListItem<'_>> = prizes
        .into_iter()
        .map(|prize| {
            let line = format!(
                "{} {} {}/{}",
                prize.id, prize.name, prize.is_used_count, prize.count
            );
            let mut style = Style::default();
            if prize.is_used {
                style = style.fg(Color::DarkGray);
            }
            if current == Some(prize.id.as_str()) {
                style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
            }
            ListItem::new(line).style(style)
        })
        .collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.locale.text("Prizes", "奖项"));
    frame.render_widget(List::new(items).block(block), area);
}

fn draw_events(frame: &mut Frame, area: Rect, app: &App) {
    let capacity = area.height.saturating_sub(2) as usize;
    let start = app.event_log.len().saturating_sub(capacity);
    let lines: Vec<Line<'_>> = app
        .event_log
        .iter()
        .skip(start)
        .map(|line| Line::from(line.clone()))
        .collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.locale.text("Events", "事件"));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_help_popup(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 50, frame.area());
    frame.render_widget(Clear, area);
    let lines = vec![
        Line::from(app.locale.text(
            "space: enter / start / stop / record",
            "空格: 进入 / 开始 / 停止 / 记录",
        )),
        Line::from(app.locale.text("esc: abandon a running draw", "Esc: 放弃进行中的抽奖")),
        Line::from(app.locale.text(
            "left/right or p/n: previous/next prize",
            "左右方向键或 p/n: 切换奖项",
        )),
        Line::from(app.locale.text(
            "u: mark prize drawn/reopen | R: clear all winners",
            "u: 标记奖项已抽完/重新开放 | R: 清空中奖记录",
        )),
        Line::from(app.locale.text(
            "ctrl+l: clear log | ? help | q quit",
            "ctrl+l: 清空日志 | ? 帮助 | q 退出",
        )),
    ];
    let block = Block::default()
        .title(app.locale.text("Help", "帮助"))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use luckydraw_core::{
        render_card, Candidate, CardMode, CardSlot, CardStyle, DisplayConfig, Euler, RngState,
        Transform, Vec3,
    };

    fn stage_with(position: Vec3) -> Stage {
        let display = DisplayConfig::default();
        let occupant = Candidate::new(1, "A");
        let visual = render_card(
            &occupant,
            &CardStyle::idle(&display),
            0,
            CardMode::Sphere,
            &mut RngState::from_seed(1),
        );
        let mut stage = Stage::new(3000.0);
        stage.slots.push(CardSlot {
            index: 0,
            transform: Transform::at(position),
            visible: true,
            winner: false,
            occupant,
            visual,
        });
        stage
    }

    const VIEW: Viewport = Viewport {
        width: 1920.0,
        height: 1080.0,
    };

    #[test]
    fn centre_projects_to_origin() {
        let stage = stage_with(Vec3::ZERO);
        let point = project(&stage, 0, VIEW).expect("visible");
        assert_eq!((point.x, point.y), (0.0, 0.0));
    }

    #[test]
    fn nearer_cards_grow() {
        let far = project(&stage_with(Vec3::new(100.0, 0.0, 0.0)), 0, VIEW).expect("far");
        let near = project(&stage_with(Vec3::new(100.0, 0.0, 1000.0)), 0, VIEW).expect("near");
        assert!(near.scale > far.scale);
        assert!(near.x > far.x);
    }

    #[test]
    fn behind_camera_is_culled() {
        assert!(project(&stage_with(Vec3::new(0.0, 0.0, 3500.0)), 0, VIEW).is_none());
    }

    #[test]
    fn scene_rotation_moves_cards() {
        let mut stage = stage_with(Vec3::new(500.0, 0.0, 0.0));
        stage.scene_rotation = Euler {
            x: 0.0,
            y: std::f64::consts::PI,
            z: 0.0,
        };
        let point = project(&stage, 0, VIEW).expect("visible");
        assert!(point.x < 0.0);
    }
}
