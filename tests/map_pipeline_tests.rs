//! Map discovery, pin, clear, and update sequencing against canned bpftool
//! output, using a recording fake runner.

use std::cell::RefCell;
use std::rc::Rc;

use blockpath::maptool::{MapTool, PIN_PATH};
use blockpath::shell::CommandRunner;

/// Records every issued command and answers from canned output.
struct FakeRunner {
    listing: String,
    pin_probe: String,
    dump: String,
    commands: Rc<RefCell<Vec<String>>>,
}

impl FakeRunner {
    fn new(listing: &str, pin_probe: &str, dump: &str) -> (Self, Rc<RefCell<Vec<String>>>) {
        let commands = Rc::new(RefCell::new(Vec::new()));
        let runner = Self {
            listing: listing.to_string(),
            pin_probe: pin_probe.to_string(),
            dump: dump.to_string(),
            commands: Rc::clone(&commands),
        };
        (runner, commands)
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, command: &str) -> String {
        self.commands.borrow_mut().push(command.to_string());
        if command.starts_with("bpftool map show") {
            self.listing.clone()
        } else if command.starts_with("ls ") {
            self.pin_probe.clone()
        } else if command.starts_with("bpftool map dump") {
            self.dump.clone()
        } else {
            String::new()
        }
    }
}

#[test]
fn fresh_system_scenario() {
    // No pin exists, one listing entry, empty map: locate, pin without
    // unpinning, skip the delete, then update with the encoded record.
    let (runner, commands) = FakeRunner::new(
        "7: hash  name block_path_map  flags 0x0\n",
        "",
        "Found 0 elements\n",
    );
    let tool = MapTool::new(runner);

    let id = tool.locate().expect("map is listed");
    assert_eq!(id, "7");

    let pinned = tool.pin(&id);
    pinned.install("/var/log/app.log");

    let commands = commands.borrow();
    assert!(commands
        .iter()
        .any(|c| c == &format!("bpftool map pin id 7 {PIN_PATH}")));
    assert!(!commands.iter().any(|c| c.contains("unpin")));
    assert!(!commands.iter().any(|c| c.contains("delete")));

    let update = commands
        .iter()
        .find(|c| c.starts_with("bpftool map update pinned"))
        .expect("update issued");
    assert!(update.contains("key hex 00 00 00 00"));
    assert!(update.contains("value hex"));
    // parent "log" precedes child "app.log" in the value blocks
    let parent_at = update.find("6c 6f 67 00").expect("parent hex present");
    let child_at = update
        .find("61 70 70 2e 6c 6f 67 00")
        .expect("child hex present");
    assert!(parent_at < child_at);
}

#[test]
fn stale_pin_is_unpinned_before_pinning() {
    let (runner, commands) = FakeRunner::new(
        "9: hash  name block_path_map  flags 0x0\n",
        "block_path_map\n",
        "Found 0 elements\n",
    );
    let tool = MapTool::new(runner);

    tool.pin("9");

    let commands = commands.borrow();
    let unpin_at = commands
        .iter()
        .position(|c| c == &format!("bpftool map unpin {PIN_PATH}"))
        .expect("stale pin removed");
    let pin_at = commands
        .iter()
        .position(|c| c == &format!("bpftool map pin id 9 {PIN_PATH}"))
        .expect("map pinned");
    assert!(unpin_at < pin_at);
}

#[test]
fn clear_deletes_when_map_holds_an_entry() {
    let dump = "key: 00 00 00 00  value: 6c 6f 67 00\nFound 1 element\n";
    let (runner, commands) = FakeRunner::new("", "", dump);
    let tool = MapTool::new(runner);

    tool.pin("3").clear();

    let commands = commands.borrow();
    assert!(commands
        .iter()
        .any(|c| c == &format!("bpftool map delete pinned {PIN_PATH} key hex 00 00 00 00")));
}

#[test]
fn clear_skips_delete_on_empty_map() {
    let (runner, commands) = FakeRunner::new("", "", "Found 0 elements\n");
    let tool = MapTool::new(runner);

    tool.pin("3").clear();

    let commands = commands.borrow();
    assert!(commands.iter().any(|c| c.starts_with("bpftool map dump")));
    assert!(!commands.iter().any(|c| c.contains("delete")));
}

#[test]
fn locator_takes_last_matching_line() {
    let listing = "\
3: hash  name block_path_map  flags 0x0
5: hash  name traffic_counters  flags 0x0
12: hash  name block_path_map  flags 0x0
";
    let (runner, _commands) = FakeRunner::new(listing, "", "");
    let tool = MapTool::new(runner);
    assert_eq!(tool.locate().expect("listed"), "12");
}

#[test]
fn missing_map_aborts_without_side_effects() {
    let (runner, commands) = FakeRunner::new("4: hash  name other_map  flags 0x0\n", "", "");
    let tool = MapTool::new(runner);

    assert!(tool.locate().is_err());

    // Only the listing was consulted; no pin/clear/update was attempted.
    let commands = commands.borrow();
    assert_eq!(*commands, vec!["bpftool map show".to_string()]);
}

#[test]
fn install_twice_clears_before_each_update() {
    let (runner, commands) = FakeRunner::new(
        "7: hash  name block_path_map  flags 0x0\n",
        "",
        "key: 00 00 00 00  value: 6c 6f 67 00\nFound 1 element\n",
    );
    let tool = MapTool::new(runner);

    let pinned = tool.pin("7");
    pinned.install("/var/log/app.log");
    pinned.install("/var/log/app.log");

    let commands = commands.borrow();
    let updates: Vec<&String> = commands
        .iter()
        .filter(|c| c.starts_with("bpftool map update"))
        .collect();
    let deletes = commands
        .iter()
        .filter(|c| c.starts_with("bpftool map delete"))
        .count();

    // Each install dumped and deleted before updating, and both updates
    // wrote the identical record.
    assert_eq!(updates.len(), 2);
    assert_eq!(deletes, 2);
    assert_eq!(updates[0], updates[1]);
}
