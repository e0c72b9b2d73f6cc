fn main() {
    // Re-embed the dashboard when it changes
    println!("cargo:rerun-if-changed=templates/");
}
