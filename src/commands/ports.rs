//! Port and tool discovery commands

use idflasher_core::ports::{self, Port};
use idflasher_core::Config;

/// List serial ports, marking likely target boards
pub fn run_list_ports() -> Result<(), Box<dyn std::error::Error>> {
    let ports = ports::list_ports()?;
    print!("{}", format_port_table(&ports));
    Ok(())
}

/// Print the resolved flashing tool
pub fn run_locate_tool(config: &Config) {
    let tool = config.flash_tool();
    println!("Flash tool: {}", tool);
    println!(
        "Target:     {} @ {} baud (firmware 0x{:X}, serial 0x{:X})",
        config.target.chip,
        config.target.baud,
        config.target.firmware_offset,
        config.target.serial_offset
    );
}

fn format_port_table(ports: &[Port]) -> String {
    if ports.is_empty() {
        return "No serial ports found\n".to_string();
    }

    let mut out = String::from("Serial ports:\n\n");
    for port in ports {
        let marker = if port.is_likely_target() { "*" } else { " " };
        out.push_str(&format!("{} {:<20} {}\n", marker, port.name, port.description));
    }
    out.push('\n');

    match ports::suggest_port(ports) {
        Some(port) => out.push_str(&format!("Suggested port: {}\n", port.name)),
        None => {
            let count = ports.iter().filter(|p| p.is_likely_target()).count();
            if count == 0 {
                out.push_str("No likely target found; pass --port explicitly\n");
            } else {
                out.push_str(&format!(
                    "{} likely targets found; pass --port explicitly\n",
                    count
                ));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table() {
        assert_eq!(format_port_table(&[]), "No serial ports found\n");
    }

    #[test]
    fn test_table_marks_targets() {
        let ports = vec![
            Port::new("/dev/ttyS0", "n/a"),
            Port::new("/dev/ttyUSB0", "CP2102 USB to UART Bridge Controller"),
        ];
        let table = format_port_table(&ports);
        assert!(table.contains("* /dev/ttyUSB0"));
        assert!(table.contains("  /dev/ttyS0"));
        assert!(table.ends_with("Suggested port: /dev/ttyUSB0\n"));
    }

    #[test]
    fn test_table_without_suggestion() {
        let ports = vec![
            Port::new("COM3", "Silicon Labs CP210x USB to UART Bridge (COM3)"),
            Port::new("COM5", "USB-SERIAL CH340 (COM5)"),
        ];
        let table = format_port_table(&ports);
        assert!(table.ends_with("2 likely targets found; pass --port explicitly\n"));
    }
}
