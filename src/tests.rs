/*!
 * Tests for chronicle scanning and generation
 */

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use tempfile::tempdir;

use crate::config::Config;
use crate::exclusion::ExclusionSet;
use crate::generate::generate;
use crate::scanner::{walk, Scanner};
use crate::types::{TraversalResult, TreeNode, WalkMode};
use crate::writer::{ExportWriter, IndexWriter, EXPORT_HEADER};

// Write `content` at `rel` below `root`, creating parents
fn add_file(root: &Path, rel: &str, content: &str) -> io::Result<PathBuf> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(&path)?;
    file.write_all(content.as_bytes())?;
    Ok(path)
}

// Helper function to create a test directory structure
fn setup_test_directory() -> io::Result<tempfile::TempDir> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path();

    add_file(root, "main.py", "print('main')\n")?;
    add_file(root, "README.md", "# readme\n")?;
    add_file(root, "notes.txt", "notes\n")?;
    add_file(root, "src/app.js", "console.log(1);\n")?;
    add_file(root, "src/style.CSS", "body {}\n")?;
    add_file(root, "src/lib.rs", "fn main() {}\n")?;
    add_file(root, "src/nested/config.ini", "[core]\n")?;
    add_file(root, "build/out.js", "compiled\n")?;
    add_file(root, "src/build/keep.py", "# nested build\n")?;
    add_file(root, "logs/debug.log", "log\n")?;
    add_file(root, "src/trace.log", "log\n")?;
    add_file(root, ".git/config", "[core]\n")?;
    add_file(
        root,
        ".gitignore",
        "# generated\n/build\n*.log\n!important.log\n\ncache/\n",
    )?;
    add_file(root, "cache/data.json", "{}\n")?;
    add_file(root, "src/cache", "a file named cache\n")?;

    Ok(temp_dir)
}

fn exclusions_for(root: &Path) -> ExclusionSet {
    ExclusionSet::build(root, "chronicle-history", &[])
}

fn relative_files(root: &Path, files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|p| {
            p.strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

fn export_of(root: &Path) -> Vec<PathBuf> {
    match walk(root, &exclusions_for(root), WalkMode::Export).unwrap() {
        TraversalResult::Export(files) => files,
        TraversalResult::Index(_) => panic!("expected export result"),
    }
}

#[test]
fn test_export_order_and_filters() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let files = export_of(temp_dir.path());

    // Files of a directory precede its subdirectories; sorted at each level
    assert_eq!(
        relative_files(temp_dir.path(), &files),
        vec![
            "main.py",
            "notes.txt",
            "src/app.js",
            "src/style.CSS",
            "src/build/keep.py",
            "src/nested/config.ini",
        ]
    );
    Ok(())
}

#[test]
fn test_anchored_pattern_only_hits_top_level() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let set = exclusions_for(temp_dir.path());
    let root = temp_dir.path();

    assert!(set.is_excluded(&root.join("build"), root));
    assert!(set.is_excluded(&root.join("build").join("out.js"), root));
    assert!(!set.is_excluded(&root.join("src").join("build"), root));
    assert!(!set.is_excluded(&root.join("src/build/keep.py"), root));
    Ok(())
}

#[test]
fn test_directory_only_pattern_keeps_same_named_file() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let set = exclusions_for(temp_dir.path());
    let root = temp_dir.path();

    assert!(set.is_excluded(&root.join("cache"), root));
    assert!(!set.is_excluded(&root.join("src").join("cache"), root));

    let tree = Scanner::new(root, &set, Arc::new(ProgressBar::hidden()))
        .unwrap()
        .build_tree()
        .unwrap();
    let index = IndexWriter::new().format(&tree);
    assert!(!index.contains("cache/"));
    assert!(index.contains("── cache\n"));
    Ok(())
}

#[test]
fn test_unanchored_glob_excludes_every_depth() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let set = exclusions_for(temp_dir.path());
    let root = temp_dir.path();

    assert!(set.is_excluded(&root.join("logs/debug.log"), root));
    assert!(set.is_excluded(&root.join("src/trace.log"), root));
    assert!(!set.is_excluded(&root.join("logs"), root));
    Ok(())
}

#[test]
fn test_is_excluded_is_pure() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let set = exclusions_for(temp_dir.path());
    let root = temp_dir.path();
    let paths = ["src/trace.log", "main.py", "build", "src/cache", ".git"];

    let forward: Vec<bool> = paths
        .iter()
        .map(|p| set.is_excluded(&root.join(p), root))
        .collect();
    let backward: Vec<bool> = paths
        .iter()
        .rev()
        .map(|p| set.is_excluded(&root.join(p), root))
        .collect();
    let backward: Vec<bool> = backward.into_iter().rev().collect();

    assert_eq!(forward, backward);
    assert_eq!(forward, vec![true, false, true, false, true]);
    Ok(())
}

#[test]
fn test_index_tree_layout() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let root = temp_dir.path();
    let tree = match walk(root, &exclusions_for(root), WalkMode::Index).unwrap() {
        TraversalResult::Index(tree) => tree,
        TraversalResult::Export(_) => panic!("expected index result"),
    };

    let root_name = fs::canonicalize(root)?
        .file_name()
        .unwrap()
        .to_string_lossy()
        .to_string();
    let expected = [
        format!("{}/", root_name).as_str(),
        "├── .gitignore",
        "├── README.md",
        "├── logs/",
        "├── main.py",
        "├── notes.txt",
        "└── src/",
        "    ├── app.js",
        "    ├── build/",
        "    │   └── keep.py",
        "    ├── cache",
        "    ├── lib.rs",
        "    ├── nested/",
        "    │   └── config.ini",
        "    └── style.CSS",
        "",
    ]
    .join("\n");
    assert_eq!(IndexWriter::new().format(&tree), expected);
    Ok(())
}

#[test]
fn test_excluded_directory_is_pruned_not_emptied() -> io::Result<()> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path();
    add_file(root, "sub/x.txt", "x\n")?;
    add_file(root, "top.txt", "t\n")?;

    let set = ExclusionSet::build(root, "chronicle-history", &["sub".to_string()]);
    let scanner = Scanner::new(root, &set, Arc::new(ProgressBar::hidden())).unwrap();
    let tree = scanner.build_tree().unwrap();

    assert_eq!(tree.contents.len(), 1);
    assert!(matches!(&tree.contents[0], TreeNode::File { name, .. } if name == "top.txt"));
    assert!(!IndexWriter::new().format(&tree).contains("── sub"));
    assert_eq!(scanner.get_statistics().directories_pruned, 1);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_pruned_directory_is_never_opened() -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = tempdir()?;
    let root = temp_dir.path();
    add_file(root, "locked/secret.py", "x\n")?;
    add_file(root, "open.py", "y\n")?;
    fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o000))?;

    let set = ExclusionSet::build(root, "chronicle-history", &["locked/".to_string()]);
    let scanner = Scanner::new(root, &set, Arc::new(ProgressBar::hidden())).unwrap();
    let files = scanner.collect_files();

    fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o755))?;

    assert_eq!(relative_files(root, &files.unwrap()), vec!["open.py"]);
    assert_eq!(scanner.get_statistics().unreadable_entries, 0);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_skipped() -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = tempdir()?;
    let root = temp_dir.path();
    add_file(root, "a.py", "a\n")?;
    add_file(root, "locked/inner.py", "x\n")?;
    add_file(root, "z/zed.py", "z\n")?;
    fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o000))?;

    // Privileged users can list it anyway
    if fs::read_dir(root.join("locked")).is_ok() {
        fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o755))?;
        return Ok(());
    }

    let set = exclusions_for(root);
    let scanner = Scanner::new(root, &set, Arc::new(ProgressBar::hidden())).unwrap();
    let files = scanner.collect_files();
    let export_stats = scanner.get_statistics();

    let index_scanner = Scanner::new(root, &set, Arc::new(ProgressBar::hidden())).unwrap();
    let tree = index_scanner.build_tree();

    fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o755))?;

    assert_eq!(relative_files(root, &files.unwrap()), vec!["a.py", "z/zed.py"]);
    assert_eq!(export_stats.unreadable_entries, 1);

    let tree = tree.unwrap();
    let names: Vec<&str> = tree.contents.iter().map(TreeNode::name).collect();
    assert_eq!(names, vec!["a.py", "z"]);
    assert_eq!(index_scanner.get_statistics().unreadable_entries, 1);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_export_keeps_symlinked_root_path() -> io::Result<()> {
    let temp_dir = tempdir()?;
    let real = temp_dir.path().join("real");
    add_file(&real, "a.py", "print(1)\n")?;
    let link = temp_dir.path().join("link");
    std::os::unix::fs::symlink(&real, &link)?;

    let files = export_of(&link);
    assert_eq!(files, vec![link.join("a.py")]);

    let mut out = Vec::new();
    ExportWriter::new().write(&files, &mut out)?;
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(&format!("########## {} ##########", link.join("a.py").display())));
    Ok(())
}

#[test]
fn test_export_exact_output() -> io::Result<()> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path();
    add_file(root, "a.py", "print(1)\n")?;

    let files = export_of(root);
    let mut out = Vec::new();
    ExportWriter::new().write(&files, &mut out)?;

    let expected = format!(
        "{}########## {} ##########\nprint(1)\n\n\n",
        EXPORT_HEADER,
        root.join("a.py").display()
    );
    assert_eq!(String::from_utf8(out).unwrap(), expected);
    Ok(())
}

#[test]
fn test_export_preserves_comments_and_blank_lines() -> io::Result<()> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path();
    let content = "# comment\n\n\n\"\"\"docstring\"\"\"\n    \nx = 1  # trailing\n";
    add_file(root, "mod.py", content)?;

    let mut out = Vec::new();
    ExportWriter::new().write(&export_of(root), &mut out)?;
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(&format!("##########\n{}\n\n", content)));
    Ok(())
}

#[test]
fn test_missing_root_fails_before_output() {
    let temp_dir = tempdir().unwrap();
    let mut config = Config::new(temp_dir.path().join("missing"));
    config.output_dir = temp_dir.path().join("out");

    let result = generate(&config, Arc::new(ProgressBar::hidden()));
    assert!(result.is_err());
    assert!(!config.output_dir.exists());
}

#[test]
fn test_generate_is_deterministic_and_self_excluding() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let root = temp_dir.path();

    // Output directory under the root, with a non-default name
    let mut config = Config::new(root);
    config.output_dir = root.join("exports");
    config.timestamp = Some("first".to_string());
    let first = generate(&config, Arc::new(ProgressBar::hidden())).unwrap();

    config.timestamp = Some("second".to_string());
    let second = generate(&config, Arc::new(ProgressBar::hidden())).unwrap();

    let read = |p: &Option<PathBuf>| fs::read(p.as_ref().unwrap()).unwrap();
    assert_eq!(
        read(&first.outputs.export_file),
        read(&second.outputs.export_file)
    );
    assert_eq!(
        read(&first.outputs.index_file),
        read(&second.outputs.index_file)
    );

    let index = fs::read_to_string(second.outputs.index_file.unwrap())?;
    assert!(!index.contains("── exports"));
    let export = fs::read_to_string(second.outputs.export_file.as_ref().unwrap())?;
    assert!(!export.contains("_scripts-list_first"));

    let export_name = second.outputs.export_file.unwrap();
    let file_name = export_name.file_name().unwrap().to_string_lossy();
    assert!(file_name.ends_with("_scripts-list_second.txt"));
    Ok(())
}

#[test]
fn test_generate_into_root_excludes_previous_artifacts() -> io::Result<()> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path();
    add_file(root, "a.py", "print(1)\n")?;

    let mut config = Config::new(root);
    config.output_dir = root.to_path_buf();
    config.export = true;
    config.index = false;
    config.timestamp = Some("one".to_string());
    let first = generate(&config, Arc::new(ProgressBar::hidden())).unwrap();

    config.timestamp = Some("two".to_string());
    let second = generate(&config, Arc::new(ProgressBar::hidden())).unwrap();

    assert_eq!(first.export.unwrap().files_written, 1);
    assert_eq!(second.export.unwrap().files_written, 1);
    Ok(())
}

#[test]
fn test_generate_into_bracketed_output_dir_excludes_it() -> io::Result<()> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path();
    add_file(root, "a.py", "print(1)\n")?;
    add_file(root, "out1/b.py", "print(2)\n")?;

    let mut config = Config::new(root);
    config.output_dir = root.join("out[1]");
    config.export = true;
    config.index = false;
    config.timestamp = Some("one".to_string());
    let first = generate(&config, Arc::new(ProgressBar::hidden())).unwrap();

    config.timestamp = Some("two".to_string());
    let second = generate(&config, Arc::new(ProgressBar::hidden())).unwrap();

    // `out1` only looks like a match for the unescaped name
    assert_eq!(first.export.unwrap().files_written, 2);
    assert_eq!(second.export.unwrap().files_written, 2);
    let export = fs::read_to_string(second.outputs.export_file.unwrap())?;
    assert!(!export.contains("_scripts-list_one"));
    assert!(export.contains("out1/b.py"));
    Ok(())
}

#[test]
fn test_generate_only_index() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let out_dir = tempdir()?;

    let mut config = Config::new(temp_dir.path());
    config.output_dir = out_dir.path().to_path_buf();
    config.export = false;
    config.timestamp = Some("ts".to_string());
    let summary = generate(&config, Arc::new(ProgressBar::hidden())).unwrap();

    assert!(summary.outputs.export_file.is_none());
    assert!(summary.export.is_none());
    let index_path = summary.outputs.index_file.unwrap();
    assert!(index_path.exists());
    assert_eq!(summary.index_entries, Some((4, 10)));
    Ok(())
}

#[test]
fn test_generate_without_gitignore() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let out_dir = tempdir()?;

    let mut config = Config::new(temp_dir.path());
    config.output_dir = out_dir.path().to_path_buf();
    config.respect_gitignore = false;
    config.index = false;
    config.timestamp = Some("ts".to_string());
    let summary = generate(&config, Arc::new(ProgressBar::hidden())).unwrap();

    let export = fs::read_to_string(summary.outputs.export_file.unwrap())?;
    assert!(export.contains("out.js"));
    assert!(export.contains("data.json"));
    // Built-ins still apply
    assert!(!export.contains(".git/config"));
    Ok(())
}
