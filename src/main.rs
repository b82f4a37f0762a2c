fn main() -> std::process::ExitCode {
    kpiwatch_lib::run()
}
