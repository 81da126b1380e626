//! Walk through the filter flows against a console "map".
//!
//! Run with: RUST_LOG=debug cargo run --example filter_events

use event_map::{
    EventId, EventStore, FilterController, GeoPoint, GeocodeError, Geocoder, MapSurface, ViewTab,
};

/// Prints every map call instead of drawing.
struct ConsoleMap {
    next: u32,
}

impl MapSurface for ConsoleMap {
    type Marker = u32;
    type Overlay = u32;

    fn create_marker(&mut self, position: GeoPoint, title: &str) -> u32 {
        self.next += 1;
        println!("   + marker #{} '{}' at ({:.4}, {:.4})", self.next, title, position.latitude, position.longitude);
        self.next
    }

    fn remove_marker(&mut self, marker: u32) {
        println!("   - marker #{}", marker);
    }

    fn create_overlay(&mut self, _position: GeoPoint, html: &str) -> u32 {
        self.next += 1;
        println!("   + popup #{}: {}", self.next, html);
        self.next
    }

    fn remove_overlay(&mut self, overlay: u32) {
        println!("   - popup #{}", overlay);
    }

    fn trigger_resize(&mut self) {
        println!("   ~ resize");
    }
}

/// Knows a single suburb.
struct OneSuburb;

impl Geocoder for OneSuburb {
    async fn resolve(&self, address: &str) -> Result<GeoPoint, GeocodeError> {
        if address.eq_ignore_ascii_case("fitzroy") {
            Ok(GeoPoint::new(-37.7987, 144.9783))
        } else {
            Err(GeocodeError::NotFound)
        }
    }
}

const ROWS: &str = r#"[
  {"Event_Title": "Open mic", "Time": "7pm", "Venue": "Corner Hotel", "Address": "57 Swan St, Richmond",
   "url": "https://example.com/open-mic", "Date": "2025/01/10", "Latitude": "-37.8255", "Longitude": "144.9937"},
  {"Event_Title": "Jazz trio", "Time": "8pm", "Venue": "Bennetts Lane", "Address": "25 Bennetts Ln, Melbourne",
   "url": "", "Date": "2025/01/10", "Latitude": "-37.8107", "Longitude": "144.9683"},
  {"Event_Title": "Beach gig", "Time": "4pm", "Venue": "Surf Club", "Address": "Esplanade, Torquay",
   "url": "", "Date": "2025/01/11", "Latitude": "-38.3320", "Longitude": "144.3260"},
  {"Event_Title": "Secret show", "Time": "9pm", "Venue": "TBA", "Address": "TBA",
   "url": "", "Date": "2025/01/12", "Latitude": "", "Longitude": ""}
]"#;

fn print_list(controller: &FilterController<ConsoleMap>) {
    for group in controller.grouped() {
        println!("   {}", group.header);
        for event in &group.events {
            println!("     {} | {} | {}", event.title, event.time, event.venue);
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let store = match EventStore::from_json(ROWS) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    println!("1. Initial load:");
    let mut controller = FilterController::new(store, ConsoleMap { next: 0 });
    let center = controller.map().view_center();
    println!(
        "   map at ({:.4}, {:.4}) zoom {}",
        center.latitude,
        center.longitude,
        controller.map().default_zoom()
    );
    print_list(&controller);

    println!("\n2. Click two markers:");
    controller.on_marker_click(EventId(0));
    controller.on_marker_click(EventId(1));

    println!("\n3. Date range 2025/01/11 - 2025/01/12:");
    match controller.apply_date_range(Some("2025/01/11"), Some("2025/01/12")) {
        Ok(outcome) => println!("   {:?}", outcome),
        Err(e) => println!("   {}", e),
    }
    print_list(&controller);

    println!("\n4. Within 5 km of Fitzroy:");
    match controller.apply_radius_filter(&OneSuburb, "Fitzroy", "5").await {
        Ok(outcome) => println!("   {:?}", outcome),
        Err(e) => println!("   {}", e),
    }
    print_list(&controller);

    println!("\n5. Unknown address (views stay as they are):");
    if let Err(e) = controller.apply_radius_filter(&OneSuburb, "Atlantis", "5").await {
        println!("   {}", e);
    }
    print_list(&controller);

    println!("\n6. Switch to the list and back:");
    controller.show(ViewTab::List);
    controller.show(ViewTab::Map);

    if let Some(rect) = controller.map().marker_bounds() {
        println!("\nFit map to {:?} - {:?}", rect.min(), rect.max());
    }
}
