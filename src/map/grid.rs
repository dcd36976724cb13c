use super::{JunctionData, LightGroup, RoadLane, RoadSectionData};
use crate::math::{direction, Point2d, Segment, Vector2d};
use itertools::iproduct;

/// The distance from the centre of a junction to where its roads begin, in m.
const JUNCTION_RADIUS: f64 = 12.0;

/// Generates a `rows` × `cols` grid of signalised junctions, `spacing` metres apart,
/// joined by two-way roads of `lane_count` lanes in each direction.
///
/// Turns are restricted by lane: left turns leave from the leftmost lane, right turns
/// from the rightmost, and every lane may go straight on. U-turns are not possible.
/// Each junction has one light per incoming road.
pub fn grid(
    rows: usize,
    cols: usize,
    spacing: f64,
    lane_count: usize,
    max_speed: f64,
) -> (Vec<RoadSectionData>, Vec<JunctionData>) {
    let centre = |(r, c): (usize, usize)| Point2d::new(c as f64 * spacing, r as f64 * spacing);
    let junction_id = |(r, c): (usize, usize)| (r * cols + c) as u32;

    // (road id, from junction, to junction) for every road
    let mut edges = vec![];
    let mut roads = vec![];
    for (r, c) in iproduct!(0..rows, 0..cols) {
        let here = (r, c);
        let neighbours = [(r + 1 < rows).then(|| (r + 1, c)), (c + 1 < cols).then(|| (r, c + 1))];
        for there in neighbours.into_iter().flatten() {
            for (from, to) in [(here, there), (there, here)] {
                let id = roads.len() as u32 + 1;
                let (a, b) = (centre(from), centre(to));
                let dir = direction(a, b);
                let road = Segment::new(a + dir * JUNCTION_RADIUS, b - dir * JUNCTION_RADIUS);
                roads.push(RoadSectionData {
                    id,
                    polyline: road.split(0.5).to_vec(),
                    lane_count,
                    max_speed,
                });
                edges.push((id, from, to));
            }
        }
    }

    let last = lane_count.saturating_sub(1);
    let junctions: Vec<JunctionData> = iproduct!(0..rows, 0..cols)
        .map(|here| {
            let incoming = edges.iter().filter(|(_, _, to)| *to == here);
            let mut connections = vec![];
            let mut light_groups = vec![];
            for (in_id, from, _) in incoming.clone() {
                for (out_id, _, to) in edges.iter().filter(|(_, f, to)| *f == here && to != from) {
                    let turn = turn(centre(here) - centre(*from), centre(*to) - centre(here));
                    let lanes: Vec<(usize, usize)> = match turn {
                        Turn::Left => vec![(0, 0)],
                        Turn::Straight => (0..lane_count).map(|i| (i, i)).collect(),
                        Turn::Right => vec![(last, last)],
                    };
                    connections.extend(
                        lanes
                            .into_iter()
                            .map(|(a, b)| (RoadLane::new(*in_id, a), RoadLane::new(*out_id, b))),
                    );
                }
                light_groups.push(LightGroup {
                    lanes: (0..lane_count).map(|i| RoadLane::new(*in_id, i)).collect(),
                    position: roads[*in_id as usize - 1]
                        .polyline
                        .last()
                        .map_or(centre(here), |seg| seg.end),
                });
            }
            let c = centre(here);
            let h = JUNCTION_RADIUS;
            JunctionData {
                id: junction_id(here),
                polygon: vec![
                    Point2d::new(c.x - h, c.y - h),
                    Point2d::new(c.x + h, c.y - h),
                    Point2d::new(c.x + h, c.y + h),
                    Point2d::new(c.x - h, c.y + h),
                ],
                connections,
                light_groups,
            }
        })
        .collect();

    (roads, junctions)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Turn {
    Left,
    Straight,
    Right,
}

/// Classifies the turn from heading `a` to heading `b`. Positive angles are to the left.
fn turn(a: Vector2d, b: Vector2d) -> Turn {
    let cross = a.x * b.y - a.y * b.x;
    if cross.abs() < 1e-9 * a.x.hypot(a.y) * b.x.hypot(b.y) {
        Turn::Straight
    } else if cross > 0.0 {
        Turn::Left
    } else {
        Turn::Right
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::build_world;

    #[test]
    fn grid_has_two_roads_per_neighbouring_pair() {
        let (roads, junctions) = grid(2, 3, 100.0, 2, 1.5);
        // 2 rows of 2 horizontal pairs, 3 columns of 1 vertical pair
        assert_eq!(roads.len(), 2 * (2 * 2 + 3));
        assert_eq!(junctions.len(), 6);
        assert!(roads.iter().all(|road| road.polyline.len() == 2));
        let corner = &junctions[0];
        assert_eq!(corner.light_groups.len(), 2);
    }

    #[test]
    fn turns_are_restricted_by_lane() {
        let (roads, junctions) = grid(3, 3, 100.0, 2, 1.5);
        let (world, _) = build_world(&roads, &junctions).unwrap();
        let centre = junctions.iter().find(|j| j.id == 4).unwrap();
        assert_eq!(centre.light_groups.len(), 4);
        for (from, to) in &centre.connections {
            assert!(from.lane < 2 && to.lane < 2);
        }
        // Each approach has a left, a straight ahead on both lanes, and a right
        assert_eq!(centre.connections.len(), 4 * 4);
        for lane in world.iter_lanes() {
            assert!(lane.goes_to().len() <= 2);
        }
    }

    #[test]
    fn turn_directions() {
        let east = Vector2d::new(1.0, 0.0);
        assert_eq!(turn(east, Vector2d::new(0.0, 1.0)), Turn::Left);
        assert_eq!(turn(east, Vector2d::new(0.0, -1.0)), Turn::Right);
        assert_eq!(turn(east, east * 3.0), Turn::Straight);
    }
}
