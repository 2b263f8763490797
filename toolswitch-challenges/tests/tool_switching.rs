use serde_json::json;
use toolswitch_challenges::tool_switching::*;

fn incidence(rows: &[&[u8]]) -> Vec<Vec<bool>> {
    rows.iter()
        .map(|row| row.iter().map(|&v| v == 1).collect())
        .collect()
}

fn three_job_instance() -> Challenge {
    Challenge::new(3, 2, 1, incidence(&[&[1, 0], &[0, 1], &[1, 0]])).unwrap()
}

#[test]
fn test_three_job_example() {
    let challenge = three_job_instance();
    let solution = Solution {
        sequence: vec![0, 1, 2],
    };
    assert_eq!(challenge.evaluate_switches(&solution).unwrap(), 2);

    // grouping the two t0 jobs saves a switch
    let solution = Solution {
        sequence: vec![0, 2, 1],
    };
    assert_eq!(challenge.evaluate_switches(&solution).unwrap(), 1);
}

#[test]
fn test_rejects_invalid_instances() {
    assert!(Challenge::new(0, 2, 1, vec![]).is_err());
    assert!(Challenge::new(1, 2, 3, incidence(&[&[1, 0]])).is_err());
    assert!(Challenge::new(2, 2, 1, incidence(&[&[1, 0]])).is_err());
    assert!(Challenge::new(1, 3, 1, incidence(&[&[1, 0]])).is_err());
    // a job needing more tools than the magazine holds has no feasible plan
    assert!(Challenge::new(1, 2, 1, incidence(&[&[1, 1]])).is_err());
}

#[test]
fn test_rejects_non_permutations() {
    let challenge = three_job_instance();
    for sequence in [vec![0, 1], vec![0, 1, 1], vec![0, 1, 3], vec![2, 1, 0, 3]] {
        let solution = Solution { sequence };
        assert!(challenge.evaluate_switches(&solution).is_err());
    }
}

#[test]
fn test_verify_solution_bound() {
    let challenge = three_job_instance();
    let solution = Solution {
        sequence: vec![0, 1, 2],
    };
    assert_eq!(challenge.verify_solution(&solution, None).unwrap(), 2);
    assert_eq!(challenge.verify_solution(&solution, Some(2)).unwrap(), 2);
    assert!(challenge.verify_solution(&solution, Some(1)).is_err());
}

#[test]
fn test_generate_instance_is_valid_and_seeded() {
    let difficulty = Difficulty {
        num_jobs: 15,
        num_tools: 20,
    };
    let a = Challenge::generate_instance(&[7; 32], &difficulty).unwrap();
    let b = Challenge::generate_instance(&[7; 32], &difficulty).unwrap();
    assert!(a.validate().is_ok());
    assert_eq!(a.num_jobs, 15);
    assert_eq!(a.num_tools, 20);
    assert!(a.max_capacity >= 5 && a.max_capacity <= 10);
    assert_eq!(a.jobs_tools, b.jobs_tools);
    assert_eq!(a.max_capacity, b.max_capacity);
    for row in &a.jobs_tools {
        let size = row.iter().filter(|&&b| b).count();
        assert!(size >= 1 && size <= a.max_capacity);
    }

    let identity = Solution {
        sequence: (0..15).collect(),
    };
    assert!(a.evaluate_switches(&identity).is_ok());
}

#[test]
fn test_generate_instance_rejects_degenerate_difficulty() {
    let difficulty = Difficulty {
        num_jobs: 0,
        num_tools: 10,
    };
    assert!(Challenge::generate_instance(&[0; 32], &difficulty).is_err());
    let difficulty = Difficulty {
        num_jobs: 5,
        num_tools: 1,
    };
    assert!(Challenge::generate_instance(&[0; 32], &difficulty).is_err());
}

#[test]
fn test_solution_from_json_map() {
    let value = json!({ "sequence": [2, 0, 1] });
    let map = value.as_object().unwrap().clone();
    let solution = Solution::try_from(map).unwrap();
    assert_eq!(solution.sequence, vec![2, 0, 1]);
}
