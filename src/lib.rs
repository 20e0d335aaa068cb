/*!
# Timetable Editor

A browser-based school timetable editor, built in Rust.

## Overview

An operator configures a set of classes and time periods, fills in
subject/teacher assignments per class, day and period, and exports the
finished routine as a spreadsheet workbook. Every edit is validated before
it is committed: assigning the same teacher to two classes in the same
period is rejected and the visible timetable never shows the conflicting
state.

## Architecture

The application follows a client-server architecture:

### Frontend Layer
- **Technologies**: HTML, CSS, JavaScript (static pages served by the backend)
- **Key Components**:
  - Configuration form - Class count/names and period labels
  - Grid editor - One editable table per class
  - Summary table - Per-teacher, per-day assignment counts

### Backend Layer
- **Technologies**: Rust, axum
- **Core Components**:
  - Schedule store - Dense class × day × period grid with
    candidate/validate/commit mutation
  - Conflict checker - Detects a teacher double-booked across classes in the
    same period
  - Load aggregator - Counts assigned periods per teacher per day

### Data Persistence Layer
- JSON snapshot file reloaded on startup
- Gzip-compressed binary backup download/restore
- CSV and XLSX export, one table/worksheet per class

## Modules

- **schedule**: Configuration and grid model; controlled cell mutation and
  configuration resizing
- **conflict**: Teacher double-booking scan and the conflict error type
- **summary**: Teacher/day load aggregation
- **saving**: Snapshot persistence and backup serialization
- **downloader**: Export functionality (CSV, XLSX)
- **app**: Routing and handlers (feature `web`)

## REST API Endpoints

- `/api/state` - Current configuration and grid
- `/api/generate` - Build a fresh grid from the configuration
- `/api/cell` - Apply one validated cell edit
- `/api/config/...` - Resize or relabel classes and periods
- `/api/summary` - Teacher load summary
- `/api/export/{xlsx,csv}` - Spreadsheet downloads
- `/api/backup`, `/api/restore` - Snapshot backup round-trip
*/

// Re-export all modules so they appear in the documentation
pub mod app;
pub mod conflict;
pub mod downloader;
pub mod saving;
pub mod schedule;
pub mod summary;

/// Re-export everything from these modules to make it easier to use
pub use conflict::*;
pub use downloader::*;
pub use saving::*;
pub use schedule::*;
pub use summary::*;
