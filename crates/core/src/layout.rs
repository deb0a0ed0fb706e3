//! Target formations for the card slots.

use crate::{ClusterTuning, Euler, Size, SphereTuning, TableTuning, Transform, Vec3, Viewport};
use std::f64::consts::PI;

/// Row-major grid of `row_count` rows centred on the origin, facing the camera.
pub fn table_layout(
    count: usize,
    row_count: usize,
    card: Size,
    tuning: &TableTuning,
) -> Vec<Transform> {
    if count == 0 {
        return Vec::new();
    }
    let rows = row_count.clamp(1, count);
    let cols = count.div_ceil(rows);
    let step_x = card.width + tuning.column_gap;
    let step_y = card.height + tuning.row_gap;
    let half_w = (cols as f64 - 1.0) * step_x / 2.0;
    let half_h = (rows as f64 - 1.0) * step_y / 2.0;
    (0..count)
        .map(|idx| {
            let row = idx / cols;
            let col = idx % cols;
            Transform::at(Vec3::new(
                col as f64 * step_x - half_w,
                half_h - row as f64 * step_y,
                0.0,
            ))
        })
        .collect()
}

/// Fibonacci spiral over a sphere; every card's +Z faces away from the centre.
pub fn sphere_layout(count: usize, tuning: &SphereTuning) -> Vec<Transform> {
    let len = count as f64;
    (0..count)
        .map(|idx| {
            let phi = if count == 1 {
                PI / 2.0
            } else {
                (-1.0 + (2.0 * idx as f64) / len).clamp(-1.0, 1.0).acos()
            };
            let theta = (len * PI).sqrt() * phi;
            let position = Vec3::new(
                tuning.radius * theta.cos() * phi.sin(),
                tuning.radius * theta.sin() * phi.sin(),
                -tuning.radius * phi.cos(),
            );
            Transform {
                position,
                rotation: Euler::facing(position),
            }
        })
        .collect()
}

fn spacing_for(total: usize, tuning: &ClusterTuning) -> f64 {
    if total <= tuning.wide_limit {
        tuning.wide_spacing
    } else if total <= tuning.medium_limit {
        tuning.medium_spacing
    } else if total <= tuning.narrow_limit {
        tuning.narrow_spacing
    } else {
        tuning.min_spacing
    }
}

fn cards_per_row(total: usize, max_per_row: usize, tuning: &ClusterTuning) -> usize {
    let clamp = |(lo, hi): (usize, usize)| max_per_row.clamp(lo, hi.max(lo));
    if total <= tuning.medium_limit {
        tuning.small_row
    } else if total <= tuning.narrow_limit {
        clamp(tuning.medium_row)
    } else if total <= tuning.dense_limit {
        clamp(tuning.dense_row)
    } else {
        clamp(tuning.densest_row)
    }
}

fn row_step(total: usize, card: Size, tuning: &ClusterTuning) -> f64 {
    let gap = if total <= tuning.medium_limit {
        tuning.row_gap_small
    } else if total <= tuning.narrow_limit {
        tuning.row_gap_medium
    } else {
        tuning.row_gap_large
    };
    card.height + gap
}

/// Offset of slot `index` inside a winner cluster of `total` cards.
///
/// Rows are filled left to right and each row is centred on x = 0, so a row
/// with an odd card count has one card dead centre. Up to five rows the block
/// is vertically centred; beyond that it is pinned near the top with
/// compressed spacing, capped at `max_vertical_offset`.
pub fn winner_cluster_position(
    total: usize,
    card: Size,
    viewport: Viewport,
    index: usize,
    tuning: &ClusterTuning,
) -> (f64, f64) {
    if total <= 1 {
        return (0.0, 0.0);
    }
    let spacing = spacing_for(total, tuning);
    let pitch = card.width + spacing;
    let usable = (viewport.width - tuning.horizontal_margin).max(0.0);
    let max_per_row = ((usable / pitch).floor() as usize).max(1);
    let per_row = cards_per_row(total, max_per_row, tuning).max(1);

    let row = index / per_row;
    let col = index % per_row;
    let rows = total.div_ceil(per_row);
    let in_row = if row + 1 == rows {
        total - row * per_row
    } else {
        per_row
    };

    let x = if in_row % 2 == 1 {
        (col as f64 - (in_row / 2) as f64) * pitch
    } else {
        (col as f64 - (in_row as f64 - 1.0) / 2.0) * pitch
    };

    let step = row_step(total, card, tuning);
    let base_y = if rows <= 5 {
        (rows as f64 - 1.0) * step / 2.0
    } else {
        (tuning.top_anchor + (rows as f64 - 3.0) * step * tuning.top_compression)
            .min(tuning.max_vertical_offset)
    };
    (x, base_y - row as f64 * step)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(total: usize) -> Vec<(f64, f64)> {
        (0..total)
            .map(|idx| {
                winner_cluster_position(
                    total,
                    Size::default(),
                    Viewport::default(),
                    idx,
                    &ClusterTuning::default(),
                )
            })
            .collect()
    }

    #[test]
    fn single_winner_is_centred_for_any_viewport() {
        for width in [0.0, 320.0, 1920.0, 10_000.0] {
            let pos = winner_cluster_position(
                1,
                Size::default(),
                Viewport::new(width, 600.0),
                0,
                &ClusterTuning::default(),
            );
            assert_eq!(pos, (0.0, 0.0));
        }
    }

    #[test]
    fn rows_are_symmetric_around_zero() {
        for total in 2..=40 {
            let positions = cluster(total);
            let mut rows: Vec<f64> = positions.iter().map(|(_, y)| *y).collect();
            rows.dedup();
            for y in rows {
                let mut xs: Vec<f64> = positions
                    .iter()
                    .filter(|(_, row_y)| *row_y == y)
                    .map(|(x, _)| *x)
                    .collect();
                let mut mirrored: Vec<f64> = xs.iter().map(|x| -x).collect();
                xs.sort_by(f64::total_cmp);
                mirrored.sort_by(f64::total_cmp);
                for (a, b) in xs.iter().zip(&mirrored) {
                    assert!((a - b).abs() < 1e-9, "total {total}: {xs:?}");
                }
            }
        }
    }

    #[test]
    fn odd_row_has_centre_card() {
        let positions = cluster(3);
        assert_eq!(positions[1].0, 0.0);
        assert_eq!(positions[0].0, -240.0);
        assert_eq!(positions[2].0, 240.0);
    }

    #[test]
    fn small_clusters_use_five_per_row() {
        let positions = cluster(7);
        let first_row = positions[0].1;
        assert_eq!(positions.iter().filter(|(_, y)| *y == first_row).count(), 5);
        // two rows, vertically centred
        assert_eq!(positions[0].1, -positions[6].1);
    }

    #[test]
    fn tall_clusters_are_capped() {
        let positions = cluster(80);
        assert!(positions[0].1 <= ClusterTuning::default().max_vertical_offset);
        assert!(positions.iter().all(|(x, _)| x.abs() < 1920.0));
    }

    #[test]
    fn narrow_viewport_still_places_cards() {
        let pos = winner_cluster_position(
            30,
            Size::default(),
            Viewport::new(100.0, 100.0),
            29,
            &ClusterTuning::default(),
        );
        assert!(pos.0.is_finite() && pos.1.is_finite());
    }

    #[test]
    fn table_has_requested_rows() {
        let slots = table_layout(20, 4, Size::default(), &TableTuning::default());
        assert_eq!(slots.len(), 20);
        let mut ys: Vec<f64> = slots.iter().map(|t| t.position.y).collect();
        ys.dedup();
        assert_eq!(ys.len(), 4);
        assert_eq!(slots[0].position.x, -slots[4].position.x);
    }

    #[test]
    fn sphere_points_sit_on_radius_and_face_out() {
        let tuning = SphereTuning::default();
        for slot in sphere_layout(50, &tuning) {
            assert!((slot.position.length() - tuning.radius).abs() < 1e-6);
            let forward = slot.rotation.rotate(Vec3::new(0.0, 0.0, 1.0));
            assert!(forward.dot(slot.position.normalized()) > 0.999);
        }
    }

    #[test]
    fn empty_layouts() {
        assert!(table_layout(0, 7, Size::default(), &TableTuning::default()).is_empty());
        assert!(sphere_layout(0, &SphereTuning::default()).is_empty());
    }
}
