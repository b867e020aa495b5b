//! Operator descriptor tables.
//!
//! Every operator the translator recognizes is listed here as data: its builder
//! function and the shape contract of its argument. Lookups are by exact
//! operator name; anything absent takes the caller's fallback path.
use indexmap::IndexMap;
use once_cell::sync::Lazy;

// ------------------------------ Filter ---------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterShape {
    /// One literal argument.
    Scalar,
    /// Array value spread into a variadic call.
    List,
    /// `[divisor, remainder]`.
    Mod,
    /// Pattern plus options string.
    Regex,
    /// Nested predicate document.
    ElemMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOp {
    pub builder: &'static str,
    pub shape: FilterShape,
}

const FILTER_TABLE: &[(&str, &str, FilterShape)] = &[
    ("$eq", "Eq", FilterShape::Scalar),
    ("$ne", "Ne", FilterShape::Scalar),
    ("$gt", "Gt", FilterShape::Scalar),
    ("$gte", "Gte", FilterShape::Scalar),
    ("$lt", "Lt", FilterShape::Scalar),
    ("$lte", "Lte", FilterShape::Scalar),
    ("$in", "In", FilterShape::List),
    ("$nin", "Nin", FilterShape::List),
    ("$exists", "Exists", FilterShape::Scalar),
    ("$type", "Type", FilterShape::Scalar),
    ("$regex", "Regex", FilterShape::Regex),
    ("$mod", "Mod", FilterShape::Mod),
    ("$size", "Size", FilterShape::Scalar),
    ("$all", "All", FilterShape::List),
    ("$elemMatch", "ElemMatch", FilterShape::ElemMatch),
];

pub static FILTER_OPS: Lazy<IndexMap<&'static str, FilterOp>> = Lazy::new(|| {
    FILTER_TABLE
        .iter()
        .map(|&(op, builder, shape)| (op, FilterOp { builder, shape }))
        .collect()
});

// ---------------------------- Expression -------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// No argument; the operator's value is ignored.
    Nullary,
    /// One argument, itself translated as an expression.
    Unary,
    /// One argument emitted as a literal, never translated.
    Literal,
    /// An array of exactly N arguments. For N = 1 a bare value is accepted.
    Fixed(usize),
    /// An array of any length.
    Variadic,
    /// A document of named fields, emitted in the listed order.
    Structured(&'static [Param]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Translated with the expression formatter.
    Expr,
    /// Must be a string (a regex value contributes its pattern).
    Str,
    /// Must be a boolean.
    Bool,
    /// Emitted as a plain literal (`bson.D`, `bson.A`, ...).
    Literal,
    /// `$switch` branches: `[{case, then}, ...]`.
    Branches,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    /// Go text used when the field is absent.
    pub default: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExprOp {
    pub builder: &'static str,
    pub arity: Arity,
    /// Also accepts a positional array with one element per param (`$cond`).
    pub positional: bool,
}

const fn expr(name: &'static str) -> Param {
    Param { name, kind: ParamKind::Expr, default: "nil" }
}

const fn expr_or(name: &'static str, default: &'static str) -> Param {
    Param { name, kind: ParamKind::Expr, default }
}

const fn string(name: &'static str, default: &'static str) -> Param {
    Param { name, kind: ParamKind::Str, default }
}

const fn literal(name: &'static str) -> Param {
    Param { name, kind: ParamKind::Literal, default: "nil" }
}

const UNARY: &[(&str, &str)] = &[
    ("$abs", "ExprAbs"),
    ("$ceil", "ExprCeil"),
    ("$floor", "ExprFloor"),
    ("$sqrt", "ExprSqrt"),
    ("$ln", "ExprLn"),
    ("$type", "ExprType"),
    ("$isArray", "ExprIsArray"),
    ("$isNumber", "ExprIsNumber"),
    ("$toLower", "ExprToLower"),
    ("$toUpper", "ExprToUpper"),
    ("$strLenCP", "ExprStrLenCP"),
    ("$year", "ExprYear"),
    ("$month", "ExprMonth"),
    ("$dayOfMonth", "ExprDayOfMonth"),
    ("$hour", "ExprHour"),
    ("$minute", "ExprMinute"),
    ("$second", "ExprSecond"),
    ("$millisecond", "ExprMillisecond"),
    ("$dayOfYear", "ExprDayOfYear"),
    ("$dayOfWeek", "ExprDayOfWeek"),
    ("$isoWeek", "ExprISOWeek"),
    ("$isoWeekYear", "ExprISOWeekYear"),
    ("$toDate", "ExprToDate"),
    ("$toDecimal", "ExprToDecimal"),
    ("$toDouble", "ExprToDouble"),
    ("$toInt", "ExprToInt"),
    ("$toLong", "ExprToLong"),
    ("$toObjectId", "ExprToObjectId"),
    ("$toString", "ExprToString"),
    ("$toBool", "ExprToBool"),
    ("$reverseArray", "ExprReverseArray"),
    ("$objectToArray", "ExprObjectToArray"),
    ("$arrayToObject", "ExprArrayToObject"),
    ("$anyElementTrue", "ExprAnyElementTrue"),
    ("$allElementsTrue", "ExprAllElementsTrue"),
];

const ACCUMULATORS: &[(&str, &str)] = &[
    ("$sum", "AccSum"),
    ("$avg", "AccAvg"),
    ("$min", "AccMin"),
    ("$max", "AccMax"),
    ("$first", "AccFirst"),
    ("$last", "AccLast"),
    ("$push", "AccPush"),
    ("$addToSet", "AccAddToSet"),
    ("$stdDevPop", "AccStdDevPop"),
    ("$stdDevSamp", "AccStdDevSamp"),
];

const NULLARY: &[(&str, &str)] = &[("$count", "AccCount"), ("$rand", "ExprRand")];

const FIXED: &[(&str, &str, usize)] = &[
    ("$not", "ExprBoolNot", 1),
    ("$subtract", "ExprSubtract", 2),
    ("$divide", "ExprDivide", 2),
    ("$mod", "ExprMod", 2),
    ("$pow", "ExprPow", 2),
    ("$log", "ExprLog", 2),
    ("$round", "ExprRound", 2),
    ("$cmp", "ExprCmp", 2),
    ("$eq", "ExprEq", 2),
    ("$ne", "ExprNe", 2),
    ("$gt", "ExprGt", 2),
    ("$gte", "ExprGte", 2),
    ("$lt", "ExprLt", 2),
    ("$lte", "ExprLte", 2),
    ("$ifNull", "ExprIfNull", 2),
    ("$split", "ExprSplit", 2),
    ("$arrayElemAt", "ExprArrayElemAt", 2),
    ("$setDifference", "ExprSetDifference", 2),
    ("$setIsSubset", "ExprSetIsSubset", 2),
    ("$in", "ExprIn", 2),
    ("$indexOfArray", "ExprIndexOfArray", 2),
    ("$substr", "ExprSubstr", 3),
];

const VARIADIC: &[(&str, &str)] = &[
    ("$add", "ExprAdd"),
    ("$multiply", "ExprMultiply"),
    ("$concat", "ExprConcat"),
    ("$concatArrays", "ExprConcatArrays"),
    ("$setEquals", "ExprSetEquals"),
    ("$setIntersection", "ExprSetIntersection"),
    ("$setUnion", "ExprSetUnion"),
    ("$mergeObjects", "ExprMergeObjects"),
    ("$slice", "ExprSlice"),
    ("$and", "ExprBoolAnd"),
    ("$or", "ExprBoolOr"),
];

const INPUT_AS_COND: &[Param] = &[expr("input"), string("as", "\"this\""), expr("cond")];
const INPUT_AS_IN: &[Param] = &[expr("input"), string("as", "\"this\""), expr("in")];
const REDUCE: &[Param] = &[expr("input"), expr("initialValue"), expr("in")];
const LET: &[Param] = &[literal("vars"), expr("in")];
const REGEX: &[Param] = &[expr("input"), string("regex", "\"\""), string("options", "\"\"")];
const REPLACE: &[Param] = &[expr("input"), expr("find"), expr("replacement")];
const TRIM: &[Param] = &[expr("input"), expr("chars")];
const COND: &[Param] = &[expr("if"), expr("then"), expr("else")];
const SWITCH: &[Param] = &[
    Param { name: "branches", kind: ParamKind::Branches, default: "nil" },
    expr("default"),
];
const ZIP: &[Param] = &[
    literal("inputs"),
    Param { name: "useLongestLength", kind: ParamKind::Bool, default: "false" },
    literal("defaults"),
];
const CONVERT: &[Param] = &[expr("input"), expr("to"), expr("onError"), expr("onNull")];
const DATE_TO_STRING: &[Param] = &[expr("date"), expr("format"), expr("timezone")];
const DATE_FROM_STRING: &[Param] = &[expr("dateString"), expr("format"), expr("timezone")];
const DATE_ADD: &[Param] = &[expr("startDate"), string("unit", "\"\""), expr("amount")];
const DATE_DIFF: &[Param] = &[expr("startDate"), expr("endDate"), string("unit", "\"\"")];
const DATE_TRUNC: &[Param] = &[expr("date"), string("unit", "\"\"")];
const GET_FIELD: &[Param] = &[expr("field"), expr_or("input", "\"$$CURRENT\"")];
const SET_FIELD: &[Param] = &[expr("field"), expr_or("input", "\"$$CURRENT\""), expr("value")];
const SORT_ARRAY: &[Param] = &[expr("input"), expr("sortBy")];
const INPUT_N: &[Param] = &[expr("input"), expr("n")];
const TOP: &[Param] = &[literal("sortBy"), expr("output")];
const TOP_N: &[Param] = &[literal("sortBy"), expr("output"), expr("n")];
const MEDIAN: &[Param] = &[expr("input"), string("method", "\"approximate\"")];
const PERCENTILE: &[Param] = &[expr("input"), literal("p"), string("method", "\"approximate\"")];

const STRUCTURED: &[(&str, &str, &[Param])] = &[
    ("$filter", "ExprFilter", INPUT_AS_COND),
    ("$map", "ExprMap", INPUT_AS_IN),
    ("$reduce", "ExprReduce", REDUCE),
    ("$let", "ExprLet", LET),
    ("$regexMatch", "ExprRegexMatch", REGEX),
    ("$regexFind", "ExprRegexFind", REGEX),
    ("$regexFindAll", "ExprRegexFindAll", REGEX),
    ("$replaceOne", "ExprReplaceOne", REPLACE),
    ("$replaceAll", "ExprReplaceAll", REPLACE),
    ("$trim", "ExprTrim", TRIM),
    ("$ltrim", "ExprLTrim", TRIM),
    ("$rtrim", "ExprRTrim", TRIM),
    ("$cond", "ExprCond", COND),
    ("$switch", "ExprSwitch", SWITCH),
    ("$zip", "ExprZip", ZIP),
    ("$convert", "ExprConvert", CONVERT),
    ("$dateToString", "ExprDateToString", DATE_TO_STRING),
    ("$dateFromString", "ExprDateFromString", DATE_FROM_STRING),
    ("$dateAdd", "ExprDateAdd", DATE_ADD),
    ("$dateSubtract", "ExprDateSubtract", DATE_ADD),
    ("$dateDiff", "ExprDateDiff", DATE_DIFF),
    ("$dateTrunc", "ExprDateTrunc", DATE_TRUNC),
    ("$getField", "ExprGetField", GET_FIELD),
    ("$setField", "ExprSetField", SET_FIELD),
    ("$unsetField", "ExprUnsetField", GET_FIELD),
    ("$sortArray", "ExprSortArray", SORT_ARRAY),
    ("$firstN", "AccFirstN", INPUT_N),
    ("$lastN", "AccLastN", INPUT_N),
    ("$maxN", "AccMaxN", INPUT_N),
    ("$minN", "AccMinN", INPUT_N),
    ("$top", "AccTop", TOP),
    ("$bottom", "AccBottom", TOP),
    ("$topN", "AccTopN", TOP_N),
    ("$bottomN", "AccBottomN", TOP_N),
    ("$median", "AccMedian", MEDIAN),
    ("$percentile", "AccPercentile", PERCENTILE),
];

pub static EXPR_OPS: Lazy<IndexMap<&'static str, ExprOp>> = Lazy::new(|| {
    let mut table = IndexMap::new();
    let mut add = |op: &'static str, builder: &'static str, arity: Arity| {
        let positional = op == "$cond";
        table.insert(op, ExprOp { builder, arity, positional });
    };
    for &(op, builder) in UNARY.iter().chain(ACCUMULATORS) {
        add(op, builder, Arity::Unary);
    }
    for &(op, builder) in NULLARY {
        add(op, builder, Arity::Nullary);
    }
    add("$literal", "ExprLiteral", Arity::Literal);
    for &(op, builder, n) in FIXED {
        add(op, builder, Arity::Fixed(n));
    }
    for &(op, builder) in VARIADIC {
        add(op, builder, Arity::Variadic);
    }
    for &(op, builder, params) in STRUCTURED {
        add(op, builder, Arity::Structured(params));
    }
    table
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_table_is_the_closed_set() {
        let ops: Vec<&str> = FILTER_OPS.keys().copied().collect();
        assert_eq!(ops.len(), 15);
        assert_eq!(FILTER_OPS["$mod"].shape, FilterShape::Mod);
        assert_eq!(FILTER_OPS["$all"].shape, FilterShape::List);
        assert!(!FILTER_OPS.contains_key("$options"));
        assert!(!FILTER_OPS.contains_key("$not"));
    }

    #[test]
    fn every_operator_is_listed_once() {
        let listed = UNARY.len()
            + ACCUMULATORS.len()
            + NULLARY.len()
            + 1
            + FIXED.len()
            + VARIADIC.len()
            + STRUCTURED.len();
        assert_eq!(EXPR_OPS.len(), listed);
    }

    #[test]
    fn builder_names_follow_the_builder_api() {
        assert_eq!(EXPR_OPS["$and"].builder, "ExprBoolAnd");
        assert_eq!(EXPR_OPS["$not"].arity, Arity::Fixed(1));
        assert_eq!(EXPR_OPS["$isoWeek"].builder, "ExprISOWeek");
        assert_eq!(EXPR_OPS["$toObjectId"].builder, "ExprToObjectId");
        assert_eq!(EXPR_OPS["$sum"].arity, Arity::Unary);
        assert_eq!(EXPR_OPS["$count"].arity, Arity::Nullary);
    }

    #[test]
    fn only_cond_is_positional() {
        let positional: Vec<&str> = EXPR_OPS
            .iter()
            .filter(|(_, spec)| spec.positional)
            .map(|(op, _)| *op)
            .collect();
        assert_eq!(positional, ["$cond"]);
    }

    #[test]
    fn structured_params_are_in_builder_order() {
        let Arity::Structured(params) = EXPR_OPS["$filter"].arity else {
            panic!("$filter should be structured");
        };
        let names: Vec<&str> = params.iter().map(|p| p.name).collect();
        assert_eq!(names, ["input", "as", "cond"]);
        assert_eq!(params[1].default, "\"this\"");
    }

    #[test]
    fn string_defaults_are_go_literals() {
        for spec in EXPR_OPS.values() {
            if let Arity::Structured(params) = spec.arity {
                for p in params.iter().filter(|p| p.kind == ParamKind::Str) {
                    assert!(p.default.starts_with('"') && p.default.ends_with('"'));
                }
            }
        }
    }
}
