pub mod fhir_stub {
    //! A minimal FHIR server answering every GET with a Bundle.
    //!
    //! First pages link to `page=2`; `page=2` has no `next` link.

    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::{Arc, Mutex};
    use std::thread;

    /// Path and `IncludeIdentifiers` header of every request seen.
    pub type Seen = Arc<Mutex<Vec<(String, Option<String>)>>>;

    pub fn spawn() -> (String, Seen) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        let next_base = base.clone();
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let log = Arc::clone(&log);
                let next_base = next_base.clone();
                thread::spawn(move || handle(stream, &next_base, &log));
            }
        });
        (base, seen)
    }

    fn handle(mut stream: TcpStream, base: &str, log: &Mutex<Vec<(String, Option<String>)>>) {
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).is_err() {
            return;
        }
        let mut include_identifiers = None;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("IncludeIdentifiers") {
                    include_identifiers = Some(value.trim().to_string());
                }
            }
        }
        let path = request_line
            .split_whitespace()
            .nth(1)
            .unwrap_or_default()
            .to_string();

        let body = if path.contains("page=2") {
            r#"{"resourceType":"Bundle","link":[{"relation":"self","url":"x"}]}"#.to_string()
        } else {
            format!(
                r#"{{"resourceType":"Bundle","link":[{{"relation":"next","url":"{base}/v2/fhir/Patient?page=2"}}]}}"#
            )
        };
        log.lock().unwrap().push((path, include_identifiers));

        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/fhir+json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let _ = stream.write_all(response.as_bytes());
    }
}
