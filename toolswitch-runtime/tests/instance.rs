use std::fs;
use std::path::{Path, PathBuf};
use toolswitch_runtime::*;

const STANDARD: &str = "3\n2\n1\n1 0 1\n0 1 0\n";
const YANASSE: &str = "3 2 1\n1 0 1\n0 1 0\n";

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("toolswitch-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn error_text(result: anyhow::Result<impl std::fmt::Debug>) -> String {
    format!("{:#}", result.unwrap_err())
}

#[test]
fn test_parse_standard_and_yanasse() {
    for (text, format) in [
        (STANDARD, InstanceFormat::Standard),
        (YANASSE, InstanceFormat::Yanasse),
    ] {
        let challenge = parse_instance(text, format).unwrap();
        assert_eq!(challenge.num_jobs, 3);
        assert_eq!(challenge.num_tools, 2);
        assert_eq!(challenge.max_capacity, 1);
        // rows are tools, columns are jobs
        assert_eq!(
            challenge.jobs_tools,
            vec![vec![true, false], vec![false, true], vec![true, false]]
        );
    }
}

#[test]
fn test_format_for_path() {
    assert_eq!(
        InstanceFormat::for_path(Path::new("data/Yanasse-A1.txt")),
        InstanceFormat::Yanasse
    );
    assert_eq!(
        InstanceFormat::for_path(Path::new("instances/Yanasse/L1-1.txt")),
        InstanceFormat::Yanasse
    );
    assert_eq!(
        InstanceFormat::for_path(Path::new("instances/Catanzaro/L1-1.txt")),
        InstanceFormat::Standard
    );
}

#[test]
fn test_written_instance_reads_back() {
    let challenge = parse_instance(STANDARD, InstanceFormat::Standard).unwrap();
    assert_eq!(format_instance(&challenge, InstanceFormat::Standard), STANDARD);
    assert_eq!(format_instance(&challenge, InstanceFormat::Yanasse), YANASSE);
}

#[test]
fn test_parse_errors_carry_line_numbers() {
    let text = error_text(parse_instance("3\n2\n", InstanceFormat::Standard));
    assert!(text.contains("magazine capacity"), "{}", text);

    let text = error_text(parse_instance("3\ntwo\n1\n", InstanceFormat::Standard));
    assert!(text.contains("Line 2"), "{}", text);

    let text = error_text(parse_instance("3 2 1\n1 0 1\n0 1\n", InstanceFormat::Yanasse));
    assert!(text.contains("Line 3"), "{}", text);

    let text = error_text(parse_instance("3 2 1\n1 0 1\n0 2 0\n", InstanceFormat::Yanasse));
    assert!(text.contains("'2'"), "{}", text);

    let text = error_text(parse_instance("3 2 1\n1 0 1\n", InstanceFormat::Yanasse));
    assert!(text.contains("expected 2"), "{}", text);

    let text = error_text(parse_instance("3 2 1\n1 0 1\n0 1 0\n1 1 1\n", InstanceFormat::Yanasse));
    assert!(text.contains("Line 4"), "{}", text);

    // capacity above the number of tools is rejected by the instance itself
    assert!(parse_instance("3 2 3\n1 0 1\n0 1 0\n", InstanceFormat::Yanasse).is_err());
}

#[test]
fn test_read_instance_reports_file() {
    let dir = scratch_dir("read");
    let path = dir.join("broken.txt");
    fs::write(&path, "3\n2\n").unwrap();
    let text = error_text(read_instance(&path));
    assert!(text.contains("broken.txt"), "{}", text);

    let path = dir.join("Yanasse-ok.txt");
    fs::write(&path, YANASSE).unwrap();
    assert_eq!(read_instance(&path).unwrap().num_jobs, 3);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_instance_prefixes() {
    assert_eq!(instance_prefixes("A"), vec!["A".to_string()]);
    assert_eq!(
        instance_prefixes("L1-L2"),
        vec!["L1-".to_string(), "L2-".to_string()]
    );
}

#[test]
fn test_discover_instances() {
    let dir = scratch_dir("discover");
    for name in ["L2-b.txt", "L1-b.txt", "L1-a.txt", "L10-a.txt", "A-1.txt"] {
        fs::write(dir.join(name), STANDARD).unwrap();
    }
    fs::create_dir_all(dir.join("L1-dir")).unwrap();

    let names = |files: Vec<PathBuf>| -> Vec<String> {
        files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    };
    assert_eq!(
        names(discover_instances(&dir, "L2-L1").unwrap()),
        vec!["L2-b.txt", "L1-a.txt", "L1-b.txt"]
    );
    assert_eq!(
        names(discover_instances(&dir, "L1").unwrap()),
        vec!["L1-a.txt", "L1-b.txt"]
    );
    assert_eq!(names(discover_instances(&dir, "A").unwrap()), vec!["A-1.txt"]);
    assert!(discover_instances(&dir, "B").is_err());
    assert!(discover_instances(&dir.join("missing"), "A").is_err());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_append_result_lines() {
    let dir = scratch_dir("results");
    let path = dir.join("out.csv");
    append_result(&path, 12, 0.5).unwrap();
    append_result(&path, 7, 1.25).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "12,0.5\n7,1.25\n");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_load_sequence_forms() {
    assert_eq!(load_sequence("[2, 0, 1]").unwrap().sequence, vec![2, 0, 1]);
    assert_eq!(
        load_sequence(r#"{"sequence": [1, 0]}"#).unwrap().sequence,
        vec![1, 0]
    );
    assert!(load_sequence("[1, -2]").is_err());
    assert!(load_sequence("\"nope\"").is_err());
    assert_eq!(resolve_seed(17), 17);
    assert_ne!(resolve_seed(0), 0);
}
