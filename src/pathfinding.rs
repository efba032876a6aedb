//! Best-first grid search used by chasing and returning pursuers.
//!
//! Priority is `steps + manhattan(remaining)`; equal priorities pop in push
//! order. The search stops after `budget` expansions and reports no path
//! rather than failing.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::maze::MazeGrid;
use crate::types::{Direction, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Frontier {
    priority: Reverse<(i32, u64)>,
    steps: i32,
    cell: usize,
    from: Option<(usize, Direction)>,
}

/// Directions leading from `start` to `target` through open cells. Empty when
/// `start == target`, when either end is not an open cell, or when nothing is
/// found within `budget` expansions.
pub fn find_path(maze: &MazeGrid, start: Vec2, target: Vec2, budget: usize) -> Vec<Direction> {
    if start == target || !maze.is_open(start.x, start.y) || !maze.is_open(target.x, target.y) {
        return Vec::new();
    }

    let width = maze.width();
    let index_of = |cell: Vec2| (cell.y * width + cell.x) as usize;
    let cell_of = |index: usize| Vec2::new(index as i32 % width, index as i32 / width);
    let total = (maze.width() * maze.height()) as usize;

    let mut closed = vec![false; total];
    let mut came_from: Vec<Option<(usize, Direction)>> = vec![None; total];
    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;
    heap.push(Frontier {
        priority: Reverse((start.manhattan(target), seq)),
        steps: 0,
        cell: index_of(start),
        from: None,
    });

    let target_index = index_of(target);
    let mut expansions = 0usize;
    while let Some(node) = heap.pop() {
        if closed[node.cell] {
            continue;
        }
        if expansions >= budget {
            break;
        }
        expansions += 1;
        closed[node.cell] = true;
        came_from[node.cell] = node.from;

        if node.cell == target_index {
            return rebuild(&came_from, target_index);
        }

        let current = cell_of(node.cell);
        for dir in Direction::ALL {
            let next = current.offset(dir);
            if !maze.is_open(next.x, next.y) {
                continue;
            }
            let next_index = index_of(next);
            if closed[next_index] {
                continue;
            }
            seq += 1;
            let steps = node.steps + 1;
            heap.push(Frontier {
                priority: Reverse((steps + next.manhattan(target), seq)),
                steps,
                cell: next_index,
                from: Some((node.cell, dir)),
            });
        }
    }
    Vec::new()
}

fn rebuild(came_from: &[Option<(usize, Direction)>], target: usize) -> Vec<Direction> {
    let mut path = Vec::new();
    let mut cursor = target;
    while let Some((previous, dir)) = came_from[cursor] {
        path.push(dir);
        cursor = previous;
    }
    path.reverse();
    path
}
