fn main() {
    gasex_tidy::cli::run();
}
