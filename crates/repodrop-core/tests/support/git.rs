use std::path::Path;
use std::process::Command;

use git2::Repository;

const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

pub fn git_command() -> Command {
    let mut cmd = Command::new("git");
    for key in GIT_ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    cmd.args([
        "-c",
        "user.name=Seeder",
        "-c",
        "user.email=seeder@example.test",
        "-c",
        "commit.gpgsign=false",
    ]);
    cmd
}

pub fn run_git(dir: &Path, args: &[&str]) {
    let status = git_command()
        .args(args)
        .current_dir(dir)
        .status()
        .expect("Failed to invoke git");
    assert!(status.success(), "git command failed: {:?}", args);
}

/// Create an empty bare repository standing in for the hosted remote.
pub fn init_bare(path: &Path) {
    std::fs::create_dir_all(path).expect("create bare dir");
    run_git(path, &["init", "--bare"]);
}

/// Push one commit with `files` to `branch` of the bare repository.
pub fn seed_remote(bare: &Path, scratch: &Path, branch: &str, files: &[(&str, &str)]) {
    std::fs::create_dir_all(scratch).expect("create scratch dir");
    run_git(scratch, &["init"]);
    run_git(scratch, &["symbolic-ref", "HEAD", &format!("refs/heads/{}", branch)]);
    for (name, contents) in files {
        let path = scratch.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, contents).expect("write seed file");
    }
    run_git(scratch, &["add", "-A", "."]);
    run_git(scratch, &["commit", "-m", "seed"]);
    let remote = bare.to_str().expect("utf-8 path");
    run_git(scratch, &["push", remote, branch]);
}

pub fn has_branch(bare: &Path, branch: &str) -> bool {
    let repo = Repository::open_bare(bare).expect("open bare");
    repo.find_reference(&format!("refs/heads/{}", branch)).is_ok()
}

/// Contents of `file` at the tip of `branch`, if present.
pub fn file_at(bare: &Path, branch: &str, file: &str) -> Option<String> {
    let repo = Repository::open_bare(bare).expect("open bare");
    let reference = repo.find_reference(&format!("refs/heads/{}", branch)).ok()?;
    let tree = reference.peel_to_commit().ok()?.tree().ok()?;
    let entry = tree.get_path(Path::new(file)).ok()?;
    let blob = repo.find_blob(entry.id()).ok()?;
    Some(String::from_utf8_lossy(blob.content()).to_string())
}

pub fn commit_count(bare: &Path, branch: &str) -> usize {
    let repo = Repository::open_bare(bare).expect("open bare");
    let reference = repo
        .find_reference(&format!("refs/heads/{}", branch))
        .expect("branch exists");
    let mut revwalk = repo.revwalk().expect("revwalk");
    revwalk
        .push(reference.target().expect("direct ref"))
        .expect("push tip");
    revwalk.count()
}

/// (summary, author email) of the tip commit of `branch`.
pub fn tip_commit(bare: &Path, branch: &str) -> (String, String) {
    let repo = Repository::open_bare(bare).expect("open bare");
    let commit = repo
        .find_reference(&format!("refs/heads/{}", branch))
        .expect("branch exists")
        .peel_to_commit()
        .expect("tip commit");
    let summary = commit.summary().unwrap_or_default().to_string();
    let email = commit.author().email().unwrap_or_default().to_string();
    (summary, email)
}
