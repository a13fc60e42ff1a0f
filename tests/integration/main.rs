//! Integration tests for Drover

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// Isolated cache root, registry, and config file for one test
    struct World {
        temp: TempDir,
    }

    impl World {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let registry = temp.path().join("registry");
            std::fs::create_dir_all(&registry).unwrap();

            let config = format!(
                "[cache]\nroot = \"{}\"\n\n[registries.registry]\npath = \"{}\"\n",
                temp.path().join("cache").display(),
                registry.display()
            );
            std::fs::write(temp.path().join("config.toml"), config).unwrap();

            Self { temp }
        }

        fn publish(&self, name: &str, version: &str, files: &[(&str, &str)]) {
            let dir = self.temp.path().join("registry").join(name).join(version);
            std::fs::create_dir_all(&dir).unwrap();
            for (rel, contents) in files {
                let path = dir.join(rel);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(path, contents).unwrap();
            }
        }

        fn drover(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("drover");
            cmd.arg("--no-local")
                .arg("--config")
                .arg(self.temp.path().join("config.toml"));
            cmd
        }
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("drover")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("task runner"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("drover")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("drover"));
    }

    #[test]
    fn config_path_displays() {
        let world = World::new();
        world
            .drover()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_displays_merged_config() {
        let world = World::new();
        world
            .drover()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("[registries.registry]"));
    }

    #[test]
    fn config_init_refuses_to_overwrite() {
        let world = World::new();
        world
            .drover()
            .args(["config", "init"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn import_materializes_package() {
        let world = World::new();
        world.publish("acme/toolkit", "2.3.1", &[("tasks.sh", "echo hi")]);

        let output = world
            .drover()
            .args(["import", "acme/toolkit@^2"])
            .assert()
            .success()
            .get_output()
            .clone();

        // Printed path points at a real artifact
        let stdout = String::from_utf8(output.stdout).unwrap();
        let path = stdout.split_whitespace().last().unwrap();
        assert!(Path::new(path).join("tasks.sh").is_file());
    }

    #[test]
    fn import_unknown_origin_fails() {
        let world = World::new();
        world
            .drover()
            .args(["import", "mirror:acme/toolkit@^2"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unreachable"));
    }

    #[test]
    fn import_unsatisfiable_constraint_fails_with_hint() {
        let world = World::new();
        world.publish("acme/toolkit", "1.0.0", &[("tasks.sh", "echo hi")]);

        world
            .drover()
            .args(["import", "acme/toolkit@^2"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No version"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn run_executes_then_skips_then_forces() {
        let world = World::new();

        world
            .drover()
            .args(["run", "--", "sh", "-c", "echo task-ran"])
            .assert()
            .success()
            .stdout(predicate::str::contains("task-ran"))
            .stdout(predicate::str::contains("Done:"));

        world
            .drover()
            .args(["run", "--", "sh", "-c", "echo task-ran"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Skipped:"))
            .stdout(predicate::str::contains("task-ran").not());

        world
            .drover()
            .args(["run", "--force", "--", "sh", "-c", "echo task-ran"])
            .assert()
            .success()
            .stdout(predicate::str::contains("task-ran"));
    }

    #[test]
    fn run_failure_is_not_recorded() {
        let world = World::new();

        world
            .drover()
            .args(["run", "--", "sh", "-c", "exit 3"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("exited with code 3"));

        // The failed run left no completion marker, so it runs again
        world
            .drover()
            .args(["run", "--", "sh", "-c", "exit 3"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("exited with code 3"));
    }

    #[test]
    fn run_reruns_when_input_file_changes() {
        let world = World::new();
        let input = world.temp.path().join("input.txt");
        std::fs::write(&input, "v1").unwrap();
        let input_arg = input.display().to_string();

        world
            .drover()
            .args(["run", "--input", &input_arg, "--", "true"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Done:"));

        std::fs::write(&input, "v2").unwrap();
        world
            .drover()
            .args(["run", "--input", &input_arg, "--", "true"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Done:"));
    }

    #[test]
    fn run_exposes_import_paths_to_task() {
        let world = World::new();
        world.publish("acme/toolkit", "2.3.1", &[("tasks.sh", "echo hi")]);

        world
            .drover()
            .args([
                "run",
                "--require",
                "acme/toolkit@^2",
                "--",
                "sh",
                "-c",
                "test -n \"$DROVER_IMPORT_PATH\"",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Done:"));
    }

    #[test]
    fn cache_info_displays_root() {
        let world = World::new();
        world
            .drover()
            .args(["cache", "info"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache root:"));
    }

    #[test]
    fn cache_clear_resets_completion_markers() {
        let world = World::new();

        world
            .drover()
            .args(["run", "--", "sh", "-c", "echo once"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Done:"));

        world
            .drover()
            .args(["cache", "clear", "--yes"])
            .assert()
            .success();

        world
            .drover()
            .args(["run", "--", "sh", "-c", "echo once"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Done:"));
    }

    #[test]
    fn cache_gc_dry_run_removes_nothing() {
        let world = World::new();
        world.publish("acme/toolkit", "2.3.1", &[("tasks.sh", "echo hi")]);
        world
            .drover()
            .args(["import", "acme/toolkit@^2"])
            .assert()
            .success();

        world
            .drover()
            .args(["cache", "gc", "--days", "1", "--dry-run"])
            .assert()
            .success();

        // Artifact survives a dry run
        world
            .drover()
            .args(["run", "--require", "acme/toolkit@^2", "--", "true"])
            .assert()
            .success();
    }

    #[test]
    fn local_config_is_discovered() {
        let world = World::new();
        world.publish("acme/toolkit", "2.3.1", &[("tasks.sh", "echo hi")]);

        // Project dir with its own drover.toml pointing at the registry
        let project = world.temp.path().join("project");
        std::fs::create_dir_all(&project).unwrap();
        let local = format!(
            "[cache]\nroot = \"{}\"\n\n[registries.registry]\npath = \"{}\"\n",
            world.temp.path().join("cache").display(),
            world.temp.path().join("registry").display()
        );
        std::fs::write(project.join("drover.toml"), local).unwrap();

        let missing_global = world.temp.path().join("no-such-config.toml");
        cargo_bin_cmd!("drover")
            .arg("--config")
            .arg(&missing_global)
            .args(["import", "acme/toolkit@^2"])
            .current_dir(&project)
            .assert()
            .success();
    }
}
