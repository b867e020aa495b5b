//! End-to-end generation: query text in, formatted Go out.

use gmqb_gen::{GenError, Generator, Options, generate};
use rstest::*;

#[rstest]
#[case("$eq", "Eq")]
#[case("$ne", "Ne")]
#[case("$gt", "Gt")]
#[case("$gte", "Gte")]
#[case("$lt", "Lt")]
#[case("$lte", "Lte")]
fn scalar_comparisons(#[case] op: &str, #[case] builder: &str) {
    let input = format!(r#"{{"age": {{"{op}": 30}}}}"#);
    assert_eq!(generate(&input).unwrap(), format!(r#"gmqb.{builder}("age", 30)"#));
}

#[rstest]
#[case::equality(r#"{"name": "Alice"}"#, r#"gmqb.Eq("name", "Alice")"#)]
#[case::implicit_and(
    r#"{"name": "Alice", "age": 30}"#,
    "gmqb.And(\n\tgmqb.Eq(\"name\", \"Alice\"),\n\tgmqb.Eq(\"age\", 30),\n)"
)]
#[case::or(
    r#"{"$or": [{"status": "A"}, {"age": 50}]}"#,
    "gmqb.Or(\n\tgmqb.Eq(\"status\", \"A\"),\n\tgmqb.Eq(\"age\", 50),\n)"
)]
#[case::nested_logical(
    r#"{"$and": [{"a": 1}, {"$or": [{"b": 2}, {"c": 3}]}]}"#,
    "gmqb.And(\n\tgmqb.Eq(\"a\", 1),\n\tgmqb.Or(\n\t\tgmqb.Eq(\"b\", 2),\n\t\tgmqb.Eq(\"c\", 3),\n\t),\n)"
)]
#[case::range_on_one_field(
    r#"{"age": {"$gte": 18, "$lt": 65}}"#,
    "gmqb.And(\n\tgmqb.Gte(\"age\", 18),\n\tgmqb.Lt(\"age\", 65),\n)"
)]
#[case::in_list(r#"{"status": {"$in": ["A", "B"]}}"#, r#"gmqb.In("status", "A", "B")"#)]
#[case::nin_list(r#"{"status": {"$nin": ["D"]}}"#, r#"gmqb.Nin("status", "D")"#)]
#[case::all_list(r#"{"tags": {"$all": ["a", "b"]}}"#, r#"gmqb.All("tags", "a", "b")"#)]
#[case::exists(r#"{"email": {"$exists": false}}"#, r#"gmqb.Exists("email", false)"#)]
#[case::type_alias(r#"{"v": {"$type": "string"}}"#, r#"gmqb.Type("v", "string")"#)]
#[case::size(r#"{"tags": {"$size": 3}}"#, r#"gmqb.Size("tags", 3)"#)]
#[case::modulo(r#"{"qty": {"$mod": [4, 0]}}"#, r#"gmqb.Mod("qty", 4, 0)"#)]
#[case::regex(r#"{"name": {"$regex": "^A"}}"#, r#"gmqb.Regex("name", "^A", "")"#)]
#[case::regex_with_options(
    r#"{"name": {"$regex": "^a", "$options": "i"}}"#,
    r#"gmqb.Regex("name", "^a", "i")"#
)]
#[case::elem_match(
    r#"{"results": {"$elemMatch": {"product": "xyz", "score": {"$gte": 8}}}}"#,
    "gmqb.ElemMatch(\"results\", gmqb.And(\n\tgmqb.Eq(\"product\", \"xyz\"),\n\tgmqb.Gte(\"score\", 8),\n))"
)]
#[case::elem_match_on_values(
    r#"{"scores": {"$elemMatch": {"$gte": 80, "$lt": 85}}}"#,
    r#"gmqb.ElemMatch("scores", gmqb.Raw(bson.D{{"$gte", 80}, {"$lt", 85}}))"#
)]
#[case::object_id(
    r#"{"_id": {"$oid": "507f1f77bcf86cd799439011"}}"#,
    r#"gmqb.Eq("_id", func() bson.ObjectID { id, _ := bson.ObjectIDFromHex("507f1f77bcf86cd799439011"); return id }())"#
)]
#[case::db_pointer(
    r#"{"ref": {"$dbPointer": {"$ref": "c", "$id": {"$oid": "507f1f77bcf86cd799439011"}}}}"#,
    r#"gmqb.Eq("ref", bson.DBPointer{DB: "c", Pointer: func() bson.ObjectID { id, _ := bson.ObjectIDFromHex("507f1f77bcf86cd799439011"); return id }()})"#
)]
#[case::uuid(
    r#"{"id": {"$uuid": "00112233-4455-6677-8899-aabbccddeeff"}}"#,
    r#"gmqb.Eq("id", bson.Binary{Subtype: 0x04, Data: []byte{0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff}})"#
)]
#[case::modulo_truncates_doubles(r#"{"q": {"$mod": [4.5, 1]}}"#, r#"gmqb.Mod("q", 4, 1)"#)]
#[case::embedded_document(
    r#"{"size": {"h": 14, "w": 21.0}}"#,
    r#"gmqb.Eq("size", bson.D{{"h", 14}, {"w", 21.0}})"#
)]
#[case::expr(
    r#"{"$expr": {"$gt": ["$spent", "$budget"]}}"#,
    r#"gmqb.Expr(gmqb.ExprGt("$spent", "$budget"))"#
)]
#[case::empty("{}", "")]
fn filters(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(generate(input).unwrap(), expected);
}

#[rstest]
#[case::empty("[]", "gmqb.NewPipeline()")]
#[case::match_limit(
    r#"[{"$match": {"status": "A"}}, {"$limit": 10}]"#,
    "gmqb.NewPipeline().\n\tMatch(gmqb.Eq(\"status\", \"A\")).\n\tLimit(10)"
)]
#[case::group(
    r#"[{"$group": {"_id": "$country", "total": {"$sum": "$amount"}, "avgAge": {"$avg": "$age"}}}]"#,
    "gmqb.NewPipeline().\n\tGroup(gmqb.GroupSpec(\"$country\",\n\t\tgmqb.GroupAcc(\"total\", gmqb.AccSum(\"$amount\")),\n\t\tgmqb.GroupAcc(\"avgAge\", gmqb.AccAvg(\"$age\")),\n\t))"
)]
#[case::group_id_last(
    r#"[{"$group": {"total": {"$sum": "$amount"}, "_id": "$country"}}]"#,
    "gmqb.NewPipeline().\n\tGroup(gmqb.GroupSpec(\"$country\",\n\t\tgmqb.GroupAcc(\"total\", gmqb.AccSum(\"$amount\")),\n\t))"
)]
#[case::add_fields(
    r#"[{"$addFields": {"total": {"$add": ["$price", "$tax"]}}}]"#,
    "gmqb.NewPipeline().\n\tAddFields(gmqb.AddFieldsSpec(\n\t\tgmqb.AddField(\"total\", gmqb.ExprAdd(\"$price\", \"$tax\")),\n\t))"
)]
#[case::set_with_cond(
    r#"[{"$set": {"isAdult": {"$cond": {"if": {"$gte": ["$age", 18]}, "then": true, "else": false}}}}]"#,
    "gmqb.NewPipeline().\n\tSetFields(gmqb.AddFieldsSpec(\n\t\tgmqb.AddField(\"isAdult\", gmqb.ExprCond(gmqb.ExprGte(\"$age\", 18), true, false)),\n\t))"
)]
#[case::project_is_literal(
    r#"[{"$project": {"name": {"$toUpper": "$name"}, "_id": 0}}]"#,
    "gmqb.NewPipeline().\n\tProject(bson.D{\n\t\tbson.E{\"name\", bson.D{{\"$toUpper\", \"$name\"}}},\n\t\tbson.E{\"_id\", 0},\n\t})"
)]
#[case::match_then_sort(
    r#"[{"$match": {"status": "A", "qty": {"$gte": 5}}}, {"$sort": {"qty": -1}}]"#,
    "gmqb.NewPipeline().\n\tMatch(gmqb.And(\n\t\tgmqb.Eq(\"status\", \"A\"),\n\t\tgmqb.Gte(\"qty\", 5),\n\t)).\n\tSort(bson.D{\n\t\tbson.E{\"qty\", -1},\n\t})"
)]
#[case::skip_unwind_count(
    r#"[{"$skip": 5}, {"$unwind": "$tags"}, {"$count": "n"}]"#,
    "gmqb.NewPipeline().\n\tSkip(5).\n\tUnwind(\"$tags\").\n\tCount(\"n\")"
)]
#[case::out_to_db(
    r#"[{"$out": {"db": "reports", "coll": "daily"}}]"#,
    "gmqb.NewPipeline().\n\tOutToDb(\"reports\", \"daily\")"
)]
#[case::unknown_stage(
    r#"[{"$bucketAuto": {"groupBy": "$price", "buckets": 4}}]"#,
    "gmqb.NewPipeline().\n\tRawStage(\"$bucketAuto\", bson.D{{\"groupBy\", \"$price\"}, {\"buckets\", 4}})"
)]
fn pipelines(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(generate(input).unwrap(), expected);
}

#[rstest]
#[case::wrong_mod_arity(r#"{"qty": {"$mod": [4]}}"#)]
#[case::logical_without_array(r#"{"$or": {"a": 1}}"#)]
#[case::list_without_array(r#"{"status": {"$in": "A"}}"#)]
#[case::two_key_stage(r#"[{"$match": {}, "$limit": 1}]"#)]
#[case::text_limit(r#"[{"$limit": "ten"}]"#)]
#[case::scalar_stage("[5]")]
fn translation_errors(#[case] input: &str) {
    assert!(
        matches!(generate(input), Err(GenError::Translation(_))),
        "{input}"
    );
}

#[test]
fn unknown_filter_operator_fails_hard() {
    let err = generate(r#"{"loc": {"$near": [1, 2]}}"#).unwrap_err();
    assert_eq!(err, GenError::UnsupportedOperator { operator: "$near".to_string() });
    assert_eq!(err.to_string(), "unsupported operator: $near");
}

#[test]
fn raw_filter_fallback_is_opt_in() {
    let generator = Generator::new(Options { raw_filter_fallback: true, ..Options::default() });
    assert_eq!(
        generator.generate(r#"{"loc": {"$near": [1, 2]}}"#).unwrap(),
        r#"gmqb.Raw(bson.D{{"loc", bson.D{{"$near", bson.A{1, 2}}}}})"#
    );
}

#[rstest]
#[case("not json")]
#[case(r#"{"a": }"#)]
#[case(r#"{"_id": {"$oid": "xyz"}}"#)]
#[case("[1, 2")]
fn parse_errors(#[case] input: &str) {
    let err = generate(input).unwrap_err();
    assert!(matches!(err, GenError::Parse(_)), "{err:?}");
    assert!(err.to_string().starts_with("failed to parse JSON: "));
}

#[test]
fn pretty_and_compact_inputs_agree() {
    let compact = r#"[{"$match":{"a":{"$in":[1,2]},"b":"x"}},{"$group":{"_id":null,"n":{"$sum":1}}}]"#;
    let pretty = "[\n  {\n    \"$match\": {\n      \"a\": { \"$in\": [1, 2] },\n      \"b\": \"x\"\n    }\n  },\n  { \"$group\": { \"_id\": null, \"n\": { \"$sum\": 1 } } }\n]\n";
    assert_eq!(generate(compact).unwrap(), generate(pretty).unwrap());
}
