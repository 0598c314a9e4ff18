pub fn print_info(message: &str) {
    println!("[revis][INFO] {message}");
}

pub fn print_error(message: &str) {
    eprintln!("[revis][ERROR]: {message}");
}

pub fn print_text_result(statement_id: u64, text: &str) {
    println!("[{statement_id}] {text}");
}
