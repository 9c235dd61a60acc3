use common::{AggregateFn, BinaryOperator, SortDirection};

/// One command of the query language, as produced by [`crate::parse`].
/// The executor dispatches on the variant and reads only its own fields.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedQuery {
    Load {
        table: String,
    },
    LoadMatrix {
        matrix: String,
    },
    Print {
        table: String,
    },
    PrintMatrix {
        matrix: String,
    },
    Export {
        table: String,
    },
    ExportMatrix {
        matrix: String,
    },
    RenameColumn {
        table: String,
        from: String,
        to: String,
    },
    RenameMatrix {
        from: String,
        to: String,
    },
    Project {
        result: String,
        source: String,
        columns: Vec<String>,
    },
    Select {
        result: String,
        source: String,
        condition: SelectCondition,
    },
    Join {
        result: String,
        left: String,
        right: String,
        left_column: String,
        right_column: String,
        operator: BinaryOperator,
    },
    Cross {
        result: String,
        left: String,
        right: String,
    },
    Distinct {
        result: String,
        source: String,
    },
    Sort {
        table: String,
        keys: Vec<(String, SortDirection)>,
    },
    Order {
        result: String,
        source: String,
        column: String,
        direction: SortDirection,
    },
    Group {
        result: String,
        source: String,
        group_column: String,
        having: HavingClause,
        returning: AggregateExpr,
    },
    Transpose {
        matrix: String,
    },
    CheckSymmetry {
        matrix: String,
    },
    Clear {
        relation: String,
    },
    Source {
        script: String,
    },
    ListTables,
    Quit,
}

/// Predicate of a SELECT: a column compared against a literal or another
/// column.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectCondition {
    ColumnLiteral {
        column: String,
        operator: BinaryOperator,
        literal: i64,
    },
    ColumnColumn {
        left: String,
        operator: BinaryOperator,
        right: String,
    },
}

/// `AGG(column)` as written in GROUP clauses.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateExpr {
    pub func: AggregateFn,
    pub column: String,
}

/// `HAVING AGG(column) op literal`.
#[derive(Clone, Debug, PartialEq)]
pub struct HavingClause {
    pub aggregate: AggregateExpr,
    pub operator: BinaryOperator,
    pub literal: i64,
}
