//! Shared snapshot used by the scoring tests.
//!
//! Alpha: finds on caches 1 and 4 (20 each) plus cache 5, which has no
//! coordinates; 3 of extras item 7 worth 2; hid caches 2 and 3 (5 creative
//! points each); 2 caches not returned and 15 minutes late. 40 + 6 + 10 - 19
//! = 37, final score 370.

use crate::snapshot::Snapshot;

pub const SNAPSHOT_JSON: &str = r#"{
    "number_game_caches": 5,
    "cache_list": [
        {"cache_number": 1, "team_id": 2, "has_coordinates": true, "handout": true, "returned": true, "total_hide_points": 2, "total_find_points": 20},
        {"cache_number": 2, "team_id": 1, "has_coordinates": true, "handout": true, "returned": false, "total_hide_points": 5, "total_find_points": 10},
        {"cache_number": 3, "team_id": 1, "has_coordinates": true, "handout": true, "returned": false, "total_hide_points": 5, "total_find_points": 10},
        {"cache_number": 4, "team_id": 2, "has_coordinates": true, "handout": true, "returned": true, "total_hide_points": 4, "total_find_points": 20},
        {"cache_number": 5, "team_id": 0, "has_coordinates": false, "handout": false, "returned": false, "total_hide_points": 0, "total_find_points": 7}
    ],
    "teams": [
        {"team_id": 1, "team_name": "Alpha", "team_members": "Ann, Al", "competing": true,
         "caches": [2, 3], "trad_finds": [1, 0, 0, 1, 1], "extra_finds": {"7": 3},
         "not_returned_caches": 2, "late": 15, "final_score": 370},
        {"team_id": 2, "team_name": "bravo", "competing": true,
         "caches": [1, 4], "trad_finds": [0, 1, 1, 0, 0], "extra_finds": {},
         "not_returned_caches": 0, "late": 0, "final_score": 300},
        {"team_id": 3, "team_name": "Charlie", "competing": false,
         "caches": [], "trad_finds": [], "extra_finds": {}, "final_score": null},
        {"team_id": 4, "team_name": "Delta", "competing": true,
         "caches": [], "trad_finds": [], "extra_finds": {"9": 1}, "final_score": -1000}
    ],
    "trad_points": [
        {"id": 1, "item_name": "Find points", "hide_or_find": "F", "points_list": [20, 10, 10, 20, 7]},
        {"id": 10, "item_name": "Creative", "hide_or_find": "H", "points_list": [0, 5, 5, 3, 0]},
        {"id": 11, "item_name": "Walking distance", "hide_or_find": "H", "points_list": [2, 0, 0, 1, 0]}
    ],
    "extras_points": [
        {"id": 7, "short_name": "P1", "long_name": "Puzzle 1", "point_value": 2},
        {"id": 8, "short_name": "P2", "long_name": "", "point_value": 5}
    ],
    "use_totals_for_best_cache_calculation": false,
    "warning_cache_not_in_handout": false,
    "warning_cache_not_in_gpx": false,
    "unallocated_caches": [5]
}"#;

pub fn snapshot() -> Snapshot {
    Snapshot::from_json(SNAPSHOT_JSON).unwrap()
}
