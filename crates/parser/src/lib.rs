//! Tokenizer and command parser for the query language.
//!
//! Parsing is purely syntactic: the output is a [`ParsedQuery`] record and
//! every check that needs the catalogue (table existence, column resolution,
//! result-name collisions) happens in the executor before any state changes.

mod ast;

pub use ast::*;

use common::{AggregateFn, BinaryOperator, DbError, DbResult, SortDirection};

/// Parse one command line into a [`ParsedQuery`].
pub fn parse(input: &str) -> DbResult<ParsedQuery> {
    let mut tokens = TokenStream::new(tokenize(input));
    let query = tokens.parse_query()?;
    tokens.expect_end()?;
    Ok(query)
}

/// Split on whitespace, with `,`, `(` and `)` as standalone tokens.
fn tokenize(input: &str) -> Vec<String> {
    let mut spaced = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            ',' | '(' | ')' => {
                spaced.push(' ');
                spaced.push(ch);
                spaced.push(' ');
            }
            _ => spaced.push(ch),
        }
    }
    spaced.split_whitespace().map(str::to_string).collect()
}

struct TokenStream {
    tokens: Vec<String>,
    position: usize,
}

impl TokenStream {
    fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn next(&mut self) -> DbResult<String> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or_else(|| DbError::Parser("unexpected end of query".into()))?;
        self.position += 1;
        Ok(token)
    }

    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.position).map(String::as_str)
    }

    fn accept(&mut self, token: &str) -> bool {
        if self.peek() == Some(token) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &str) -> DbResult<()> {
        let token = self.next()?;
        if token != expected {
            return Err(DbError::Parser(format!(
                "expected '{expected}', found '{token}'"
            )));
        }
        Ok(())
    }

    fn expect_end(&self) -> DbResult<()> {
        if let Some(extra) = self.peek() {
            return Err(DbError::Parser(format!(
                "unexpected trailing token '{extra}'"
            )));
        }
        Ok(())
    }

    fn identifier(&mut self) -> DbResult<String> {
        let token = self.next()?;
        if token == "," || token == "(" || token == ")" || token == "<-" {
            return Err(DbError::Parser(format!("expected a name, found '{token}'")));
        }
        Ok(token)
    }

    fn literal(&mut self) -> DbResult<i64> {
        let token = self.next()?;
        token
            .parse::<i64>()
            .map_err(|_| DbError::Parser(format!("expected an integer, found '{token}'")))
    }

    fn operator(&mut self) -> DbResult<BinaryOperator> {
        let token = self.next()?;
        parse_operator(&token)
            .ok_or_else(|| DbError::Parser(format!("unknown operator '{token}'")))
    }

    fn direction(&mut self) -> DbResult<SortDirection> {
        let token = self.next()?;
        match token.as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(DbError::Parser(format!(
                "expected ASC or DESC, found '{token}'"
            ))),
        }
    }

    fn aggregate(&mut self) -> DbResult<AggregateExpr> {
        let token = self.next()?;
        let func = parse_aggregate(&token)
            .ok_or_else(|| DbError::Parser(format!("unknown aggregate '{token}'")))?;
        self.expect("(")?;
        let column = self.identifier()?;
        self.expect(")")?;
        Ok(AggregateExpr { func, column })
    }

    fn parse_query(&mut self) -> DbResult<ParsedQuery> {
        let first = self.next()?;
        match first.as_str() {
            "LOAD" => {
                if self.accept("MATRIX") {
                    Ok(ParsedQuery::LoadMatrix {
                        matrix: self.identifier()?,
                    })
                } else {
                    Ok(ParsedQuery::Load {
                        table: self.identifier()?,
                    })
                }
            }
            "PRINT" => {
                if self.accept("MATRIX") {
                    Ok(ParsedQuery::PrintMatrix {
                        matrix: self.identifier()?,
                    })
                } else {
                    Ok(ParsedQuery::Print {
                        table: self.identifier()?,
                    })
                }
            }
            "EXPORT" => {
                if self.accept("MATRIX") {
                    Ok(ParsedQuery::ExportMatrix {
                        matrix: self.identifier()?,
                    })
                } else {
                    Ok(ParsedQuery::Export {
                        table: self.identifier()?,
                    })
                }
            }
            "RENAME" => {
                if self.accept("MATRIX") {
                    Ok(ParsedQuery::RenameMatrix {
                        from: self.identifier()?,
                        to: self.identifier()?,
                    })
                } else {
                    let from = self.identifier()?;
                    let to = self.identifier()?;
                    self.expect("FROM")?;
                    Ok(ParsedQuery::RenameColumn {
                        table: self.identifier()?,
                        from,
                        to,
                    })
                }
            }
            "SORT" => {
                let table = self.identifier()?;
                self.expect("BY")?;
                let mut keys = Vec::new();
                loop {
                    let column = self.identifier()?;
                    let direction = self.direction()?;
                    keys.push((column, direction));
                    if !self.accept(",") {
                        break;
                    }
                }
                Ok(ParsedQuery::Sort { table, keys })
            }
            "TRANSPOSE" => {
                self.expect("MATRIX")?;
                Ok(ParsedQuery::Transpose {
                    matrix: self.identifier()?,
                })
            }
            "CHECKSYMMETRY" => Ok(ParsedQuery::CheckSymmetry {
                matrix: self.identifier()?,
            }),
            "CLEAR" => Ok(ParsedQuery::Clear {
                relation: self.identifier()?,
            }),
            "SOURCE" => Ok(ParsedQuery::Source {
                script: self.identifier()?,
            }),
            "LIST" => {
                self.expect("TABLES")?;
                Ok(ParsedQuery::ListTables)
            }
            // Reserved, not implemented.
            "INDEX" => Err(DbError::Parser("INDEX is not implemented".into())),
            "QUIT" | "EXIT" => Ok(ParsedQuery::Quit),
            _ => self.parse_assignment(first),
        }
    }

    /// `<result> <- OPERATOR ...`
    fn parse_assignment(&mut self, result: String) -> DbResult<ParsedQuery> {
        self.expect("<-").map_err(|_| {
            DbError::Parser(format!("unknown command or missing '<-' after '{result}'"))
        })?;
        let operator = self.next()?;
        match operator.as_str() {
            "PROJECT" => {
                let mut columns = vec![self.identifier()?];
                while self.accept(",") {
                    columns.push(self.identifier()?);
                }
                self.expect("FROM")?;
                Ok(ParsedQuery::Project {
                    result,
                    source: self.identifier()?,
                    columns,
                })
            }
            "SELECT" => {
                let source = self.identifier()?;
                self.expect("WHERE")?;
                let column = self.identifier()?;
                let operator = self.operator()?;
                let rhs = self.next()?;
                let condition = match rhs.parse::<i64>() {
                    Ok(literal) => SelectCondition::ColumnLiteral {
                        column,
                        operator,
                        literal,
                    },
                    Err(_) => SelectCondition::ColumnColumn {
                        left: column,
                        operator,
                        right: rhs,
                    },
                };
                Ok(ParsedQuery::Select {
                    result,
                    source,
                    condition,
                })
            }
            "JOIN" => {
                let left = self.identifier()?;
                self.expect(",")?;
                let right = self.identifier()?;
                self.expect("ON")?;
                let left_column = unqualify(&self.identifier()?, &left)?;
                let operator = self.operator()?;
                let right_column = unqualify(&self.identifier()?, &right)?;
                Ok(ParsedQuery::Join {
                    result,
                    left,
                    right,
                    left_column,
                    right_column,
                    operator,
                })
            }
            "CROSS" => {
                let left = self.identifier()?;
                self.expect(",")?;
                Ok(ParsedQuery::Cross {
                    result,
                    left,
                    right: self.identifier()?,
                })
            }
            "DISTINCT" => Ok(ParsedQuery::Distinct {
                result,
                source: self.identifier()?,
            }),
            "ORDER" => {
                let source = self.identifier()?;
                self.expect("BY")?;
                let column = self.identifier()?;
                let direction = self.direction()?;
                Ok(ParsedQuery::Order {
                    result,
                    source,
                    column,
                    direction,
                })
            }
            "GROUP" => {
                let source = self.identifier()?;
                self.expect("BY")?;
                let group_column = self.identifier()?;
                self.expect("HAVING")?;
                let aggregate = self.aggregate()?;
                let operator = self.operator()?;
                let literal = self.literal()?;
                self.expect("RETURN")?;
                let returning = self.aggregate()?;
                Ok(ParsedQuery::Group {
                    result,
                    source,
                    group_column,
                    having: HavingClause {
                        aggregate,
                        operator,
                        literal,
                    },
                    returning,
                })
            }
            _ => Err(DbError::Parser(format!("unknown operator '{operator}'"))),
        }
    }
}

/// Strip an optional `table.` qualifier, insisting it names the right table.
fn unqualify(token: &str, table: &str) -> DbResult<String> {
    match token.split_once('.') {
        Some((qualifier, column)) => {
            if qualifier != table {
                Err(DbError::Parser(format!(
                    "column qualifier '{qualifier}' does not match table '{table}'"
                )))
            } else {
                Ok(column.to_string())
            }
        }
        None => Ok(token.to_string()),
    }
}

pub fn parse_operator(token: &str) -> Option<BinaryOperator> {
    match token {
        "==" | "=" => Some(BinaryOperator::Equal),
        "!=" | "<>" => Some(BinaryOperator::NotEqual),
        "<" => Some(BinaryOperator::Less),
        "<=" => Some(BinaryOperator::Leq),
        ">" => Some(BinaryOperator::Greater),
        ">=" => Some(BinaryOperator::Geq),
        _ => None,
    }
}

pub fn parse_aggregate(token: &str) -> Option<AggregateFn> {
    match token {
        "MIN" => Some(AggregateFn::Min),
        "MAX" => Some(AggregateFn::Max),
        "SUM" => Some(AggregateFn::Sum),
        "AVG" => Some(AggregateFn::Avg),
        "COUNT" => Some(AggregateFn::Count),
        _ => None,
    }
}
