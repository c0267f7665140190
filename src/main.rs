fn main() {
    rescue_run::game::run();
}
