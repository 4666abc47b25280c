use colored::Colorize;

// Status lines printed while reconciling

/// Field found in the local config, left untouched
pub fn print_already_set(key: &str, value: &str) {
    println!("{} {} = {}", "already set:".green(), key, value);
}

/// Field missing locally, to be fetched
pub fn print_pending(key: &str) {
    println!("{} {}", "pending:".blue(), key);
}

/// Value written to the local config
pub fn print_resolved(key: &str, value: &str) {
    println!("{} {} = {}", "set:".green(), key, value);
}

/// Expected gap, such as no signing key on the account
pub fn print_warning(msg: &str) {
    println!("{} {}", "warning:".yellow(), msg);
}

/// Field that stayed unresolved; the run continues
pub fn print_field_error(msg: &str) {
    println!("{} {}", "error:".red(), msg);
}

/// Progress message
pub fn print_info(msg: &str) {
    println!("{}", msg.blue());
}

/// Final line of a successful run
pub fn print_success(msg: &str) {
    println!("{}", msg.green());
}

/// Fatal error, printed to stderr
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "error:".red(), msg);
}
