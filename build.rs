// build.rs

fn main() {
    // Build timestamp and git revision for the version banner
    vergen::EmitBuilder::builder()
        .build_timestamp()
        .git_sha(true)
        .emit()
        .expect("Unable to generate build info");
}
