use crate::model::CellValue;

pub const ACTIONS_KEY: &str = "actions";

const EMPTY_PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn arrow(self) -> &'static str {
        match self {
            Self::Ascending => "↑",
            Self::Descending => "↓",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SortState {
    pub key: &'static str,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum Tone {
    #[default]
    Plain,
    Muted,
    Success,
    Warning,
    Error,
    Info,
    Code,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CellView {
    pub text: String,
    pub tone: Tone,
}

impl CellView {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Plain)
    }

    pub fn raw(value: &CellValue) -> Self {
        if value.is_empty() {
            Self::new(EMPTY_PLACEHOLDER, Tone::Muted)
        } else {
            Self::plain(value.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct RowContext {
    pub action_in_flight: bool,
}

pub type ValueFn<R> = fn(&R) -> CellValue;
pub type RenderFn<R> = fn(&CellValue, &R, RowContext) -> CellView;

pub struct Column<R> {
    pub key: &'static str,
    pub title: &'static str,
    pub width: Option<u16>,
    pub value: ValueFn<R>,
    pub render: Option<RenderFn<R>>,
}

impl<R> Column<R> {
    pub fn new(key: &'static str, title: &'static str, value: ValueFn<R>) -> Self {
        Self {
            key,
            title,
            width: None,
            value,
            render: None,
        }
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }

    pub fn render(mut self, render: RenderFn<R>) -> Self {
        self.render = Some(render);
        self
    }

    pub fn cell(&self, record: &R, context: RowContext) -> CellView {
        let value = (self.value)(record);
        match self.render {
            Some(render) => render(&value, record, context),
            None => CellView::raw(&value),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TableView {
    sortable: bool,
    sort: Option<SortState>,
    header_cursor: usize,
}

impl TableView {
    pub fn new(sortable: bool) -> Self {
        Self {
            sortable,
            sort: None,
            header_cursor: 0,
        }
    }

    pub fn sortable(&self) -> bool {
        self.sortable
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    pub fn header_cursor(&self) -> usize {
        self.header_cursor
    }

    pub fn activate_header(&mut self, key: &'static str) -> bool {
        if !self.sortable || key == ACTIONS_KEY {
            return false;
        }

        let direction = match &self.sort {
            Some(current) if current.key == key && current.direction == SortDirection::Ascending => {
                SortDirection::Descending
            }
            _ => SortDirection::Ascending,
        };
        self.sort = Some(SortState { key, direction });
        true
    }

    pub fn activate_cursor<R>(&mut self, columns: &[Column<R>]) -> bool {
        match columns.get(self.header_cursor) {
            Some(column) => self.activate_header(column.key),
            None => false,
        }
    }

    pub fn move_cursor(&mut self, delta: isize, column_count: usize) {
        if column_count == 0 {
            self.header_cursor = 0;
            return;
        }
        let max = column_count as isize - 1;
        self.header_cursor = (self.header_cursor as isize + delta).clamp(0, max) as usize;
    }
}

pub fn sort_records<'a, R>(
    records: Vec<&'a R>,
    columns: &[Column<R>],
    sort: Option<&SortState>,
) -> Vec<&'a R> {
    let Some(sort) = sort else {
        return records;
    };
    let Some(column) = columns.iter().find(|column| column.key == sort.key) else {
        return records;
    };

    let mut keyed = records
        .into_iter()
        .map(|record| ((column.value)(record), record))
        .collect::<Vec<_>>();
    keyed.sort_by(|(left, _), (right, _)| {
        let ordering = left.compare(right);
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    keyed.into_iter().map(|(_, record)| record).collect()
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HeaderView {
    pub key: &'static str,
    pub title: &'static str,
    pub width: Option<u16>,
    pub sort: Option<SortDirection>,
    pub focused: bool,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum GridView {
    Loading,
    Empty,
    Populated {
        headers: Vec<HeaderView>,
        rows: Vec<Vec<CellView>>,
    },
}

impl GridView {
    pub fn row_count(&self) -> usize {
        match self {
            Self::Populated { rows, .. } => rows.len(),
            _ => 0,
        }
    }
}

// `records` must already be filtered and sorted.
pub fn build_grid<R, F>(
    view: &TableView,
    columns: &[Column<R>],
    records: &[&R],
    loading: bool,
    context: F,
) -> GridView
where
    F: Fn(&R) -> RowContext,
{
    if loading {
        return GridView::Loading;
    }
    if records.is_empty() {
        return GridView::Empty;
    }

    let headers = columns
        .iter()
        .enumerate()
        .map(|(index, column)| HeaderView {
            key: column.key,
            title: column.title,
            width: column.width,
            sort: view
                .sort()
                .filter(|sort| sort.key == column.key)
                .map(|sort| sort.direction),
            focused: view.sortable() && index == view.header_cursor(),
        })
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            let record: &R = record;
            let row_context = context(record);
            columns
                .iter()
                .map(|column| column.cell(record, row_context))
                .collect()
        })
        .collect();

    GridView::Populated { headers, rows }
}
