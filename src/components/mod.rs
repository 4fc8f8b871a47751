pub mod agenda_list;
pub mod help;
pub mod status_bar;

pub use agenda_list::AgendaList;
pub use help::HelpPopup;
pub use status_bar::StatusBar;
