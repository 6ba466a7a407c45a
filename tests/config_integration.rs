use std::path::PathBuf;

use tumbless::config::{ConfigFlags, load_config_flags, parse_flag_tokens};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".tumblessrc");
    let content = r#"
# comment
--no-images

--api-key SECRET

--render-debug-log=render.log
"#;
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.no_images);
    assert_eq!(flags.api_key, Some("SECRET".to_string()));
    assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".tumblessrc");
    let content = "--no-images\n--api-key file-key\n--render-debug-log file.log\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "tumbless".to_string(),
        "--api-key".to_string(),
        "cli-key".to_string(),
        "--force-half-cell".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.no_images, "file flags should remain enabled");
    assert!(effective.force_half_cell, "cli flags should be applied");
    assert_eq!(
        effective.api_key,
        Some("cli-key".to_string()),
        "cli should override the api key"
    );
    assert_eq!(
        effective.render_debug_log,
        Some(PathBuf::from("file.log")),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_parse_flag_tokens_handles_equals_syntax() {
    let args = vec![
        "tumbless".to_string(),
        "--api-key=SECRET".to_string(),
        "--render-debug-log=render.log".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.api_key, Some("SECRET".to_string()));
    assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
}

#[test]
fn test_config_union_merges_booleans() {
    let file = ConfigFlags {
        no_images: true,
        ..ConfigFlags::default()
    };
    let cli = ConfigFlags {
        perf: true,
        force_half_cell: true,
        ..ConfigFlags::default()
    };
    let merged = file.union(&cli);
    assert!(merged.no_images);
    assert!(merged.perf);
    assert!(merged.force_half_cell);
}
